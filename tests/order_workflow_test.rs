mod support;

use std::collections::BTreeMap;
use std::sync::Arc;

use storefront_core::domain::order::{OrderError, OrderStatus, OrderWorkflow, PlaceOrderRequest};
use storefront_core::domain::Page;
use storefront_core::repository::MemoryStore;
use storefront_core::utils::RetryConfig;

use support::{seed_product, seed_user, stock_of, StubGateway};

fn workflow(store: &MemoryStore, gateway: Arc<StubGateway>) -> OrderWorkflow {
    let store = Arc::new(store.clone());
    OrderWorkflow::new(store.clone(), store.clone(), store, gateway)
        .with_retry(RetryConfig::quick())
}

fn request(user_id: i64, total_price: i64, products: &[(i64, i32)]) -> PlaceOrderRequest {
    PlaceOrderRequest {
        user_id,
        total_price,
        products: BTreeMap::from_iter(products.iter().copied()),
    }
}

#[tokio::test]
async fn place_order_commits_order_items_stock_and_payment() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;
    let scarf = seed_product(&store, "wool scarf", 30_000, 5).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway.clone());

    let order_id = orders
        .place_order(
            "payment-7b416578",
            request(user.id, 130_000, &[(jacket.id, 2), (scarf.id, 1)]),
        )
        .await
        .unwrap();

    assert_eq!(gateway.calls(), 1);
    assert_eq!(stock_of(&store, jacket.id).await, 8);
    assert_eq!(stock_of(&store, scarf.id).await, 4);

    let details = orders.get_order(order_id).await.unwrap();
    assert_eq!(details.order.user_id, user.id);
    assert_eq!(details.order.total_price, 130_000);
    assert_eq!(details.order.status, OrderStatus::Paid);
    assert_eq!(details.items.len(), 2);

    let mut prices: Vec<i64> = details.items.iter().map(|i| i.price).collect();
    prices.sort_unstable();
    assert_eq!(prices, vec![30_000, 100_000]);
    assert_eq!(
        details.order.total_price,
        details.items.iter().map(|i| i.price).sum::<i64>()
    );

    let payment = store.payment_for_order(order_id).unwrap();
    assert_eq!(payment.payment_id, "payment-7b416578");
    assert_eq!(payment.provider, "KAKAOPAY");
}

#[tokio::test]
async fn mismatched_total_fails_before_touching_anything() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;
    let scarf = seed_product(&store, "wool scarf", 30_000, 5).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway.clone());

    let err = orders
        .place_order(
            "payment-1",
            request(user.id, 120_000, &[(jacket.id, 2), (scarf.id, 1)]),
        )
        .await
        .unwrap_err();

    match err {
        OrderError::TotalPriceMismatch { claimed, computed } => {
            assert_eq!(claimed, 120_000);
            assert_eq!(computed, 130_000);
        }
        other => panic!("expected TotalPriceMismatch, got {other:?}"),
    }

    // validation failed locally: the gateway was never called and no
    // durable state changed
    assert_eq!(gateway.calls(), 0);
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.payment_count(), 0);
    assert_eq!(stock_of(&store, jacket.id).await, 10);
    assert_eq!(stock_of(&store, scarf.id).await, 5);
}

#[tokio::test]
async fn out_of_stock_at_commit_rolls_back_everything() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;
    let last_one = seed_product(&store, "limited sneaker", 90_000, 1).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway);

    // totals reconcile, so the failure happens at commit time on the
    // second line
    let err = orders
        .place_order(
            "payment-2",
            request(user.id, 280_000, &[(jacket.id, 2), (last_one.id, 2)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::OutOfStock(id) if id == last_one.id));

    // nothing from the partial commit survives
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.payment_count(), 0);
    assert_eq!(stock_of(&store, jacket.id).await, 10);
    assert_eq!(stock_of(&store, last_one.id).await, 1);
}

#[tokio::test]
async fn concurrent_orders_for_last_unit_leave_stock_at_zero() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let last_one = seed_product(&store, "limited sneaker", 90_000, 1).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = Arc::new(workflow(&store, gateway));

    let first = {
        let orders = orders.clone();
        let req = request(user.id, 90_000, &[(last_one.id, 1)]);
        tokio::spawn(async move { orders.place_order("payment-a", req).await })
    };
    let second = {
        let orders = orders.clone();
        let req = request(user.id, 90_000, &[(last_one.id, 1)]);
        tokio::spawn(async move { orders.place_order("payment-b", req).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let out_of_stock = results
        .iter()
        .filter(|r| matches!(r, Err(OrderError::OutOfStock(_))))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(stock_of(&store, last_one.id).await, 0);
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn unknown_user_fails_first() {
    let store = MemoryStore::new();
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway.clone());

    let err = orders
        .place_order("payment-3", request(999, 100_000, &[(jacket.id, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::UserNotFound(999)));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn unknown_product_fails_reconciliation() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway.clone());

    let err = orders
        .place_order("payment-4", request(user.id, 100_000, &[(777, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ProductNotFound(777)));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway);

    let err = orders
        .place_order("payment-5", request(user.id, 0, &[(jacket.id, 0)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InvalidQuantity { quantity: 0, .. }));
}

#[tokio::test]
async fn rejected_payment_surfaces_as_payment_not_found() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;

    let gateway = Arc::new(StubGateway::not_found());
    let orders = workflow(&store, gateway.clone());

    let err = orders
        .place_order("payment-missing", request(user.id, 100_000, &[(jacket.id, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::PaymentNotFound(ref r) if r == "payment-missing"));
    // permanent failure: no retry
    assert_eq!(gateway.calls(), 1);
    assert_eq!(store.order_count(), 0);
    assert_eq!(stock_of(&store, jacket.id).await, 10);
}

#[tokio::test]
async fn gateway_outage_is_retried_then_surfaced_as_retryable() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;

    let gateway = Arc::new(StubGateway::unavailable());
    let orders = workflow(&store, gateway.clone());

    let err = orders
        .place_order("payment-6", request(user.id, 100_000, &[(jacket.id, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::GatewayUnavailable(_)));
    // RetryConfig::quick() allows two attempts
    assert_eq!(gateway.calls(), 2);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn orders_can_be_listed_and_deleted_while_payment_survives() {
    let store = MemoryStore::new();
    let user = seed_user(&store).await;
    let jacket = seed_product(&store, "padded jacket", 50_000, 10).await;

    let gateway = Arc::new(StubGateway::confirming());
    let orders = workflow(&store, gateway);

    let order_id = orders
        .place_order("payment-7", request(user.id, 100_000, &[(jacket.id, 2)]))
        .await
        .unwrap();

    let page = orders.list_orders(Page::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.last);

    orders.delete_order(order_id).await.unwrap();
    assert!(matches!(
        orders.get_order(order_id).await.unwrap_err(),
        OrderError::NotFound(_)
    ));
    assert!(matches!(
        orders.delete_order(order_id).await.unwrap_err(),
        OrderError::NotFound(_)
    ));

    // the payment row is an audit record and is not cascaded
    assert!(store.payment_for_order(order_id).is_some());
}
