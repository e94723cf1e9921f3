use std::time::Duration;

use httpmock::prelude::*;

use storefront_core::config::GatewayConfig;
use storefront_core::gateway::{GatewayError, HttpPaymentGateway, PaymentGateway};
use storefront_core::utils::IsTransient;

fn gateway_for(server: &MockServer) -> HttpPaymentGateway {
    let config = GatewayConfig::for_base_url(server.base_url(), Duration::from_secs(2));
    HttpPaymentGateway::new(&config).unwrap()
}

#[tokio::test]
async fn confirmed_payment_is_parsed() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/payments/payment-7b416578");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "id": "payment-7b416578",
                "status": "PAID",
                "transactionId": "0192e18e-152c-33d8-3a0a-6a88e0eb17b6",
                "merchantId": "merchant-a633191f-848d-41f3-9621-128f52d3b187",
                "method": {"type": "PaymentMethodEasyPay", "provider": "KAKAOPAY"},
                "paidAt": "2024-11-01T12:59:16.773693Z"
            }));
    });

    let gateway = gateway_for(&server);
    let confirmation = gateway.get_payment("payment-7b416578").await.unwrap();

    mock.assert();
    assert_eq!(confirmation.id, "payment-7b416578");
    assert_eq!(confirmation.status, "PAID");
    assert_eq!(confirmation.method.method_type, "PaymentMethodEasyPay");
    assert_eq!(confirmation.method.provider, "KAKAOPAY");
}

#[tokio::test]
async fn client_error_maps_to_payment_not_found() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/payments/payment-missing");
        then.status(404)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"message": "payment not found"}));
    });

    let gateway = gateway_for(&server);
    let err = gateway.get_payment("payment-missing").await.unwrap_err();

    match &err {
        GatewayError::PaymentNotFound { reference, status } => {
            assert_eq!(reference, "payment-missing");
            assert_eq!(*status, 404);
        }
        other => panic!("expected PaymentNotFound, got {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn server_error_maps_to_transient_unavailable() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/payments/payment-1");
        then.status(503).body("upstream timeout");
    });

    let gateway = gateway_for(&server);
    let err = gateway.get_payment("payment-1").await.unwrap_err();

    match &err {
        GatewayError::Unavailable { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "upstream timeout");
        }
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_success_body_maps_to_invalid_response() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/payments/payment-2");
        then.status(200)
            .header("Content-Type", "application/json")
            .body("{\"id\": \"payment-2\"");
    });

    let gateway = gateway_for(&server);
    let err = gateway.get_payment("payment-2").await.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse(_)));
    assert!(!err.is_transient());
}
