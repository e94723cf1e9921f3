use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::utils::IsTransient;

// ============================================================================
// Payment Gateway Client
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider rejected the reference (any 4xx): the payment does not
    /// exist or cannot be resolved. Not retryable.
    #[error("payment {reference} not found (gateway status {status})")]
    PaymentNotFound { reference: String, status: u16 },

    /// The provider answered with a server error. Retryable.
    #[error("gateway returned {status}: {body}")]
    Unavailable { status: u16, body: String },

    /// The request never completed: connect failure or timeout. Retryable.
    #[error("gateway unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The provider answered 2xx with a body we cannot parse.
    #[error("unparseable gateway response: {0}")]
    InvalidResponse(String),
}

impl IsTransient for GatewayError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. } | GatewayError::Unreachable(_)
        )
    }
}

/// What the provider actually charged for a payment reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub id: String,
    pub status: String,
    pub transaction_id: String,
    pub merchant_id: String,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub method_type: String,
    pub provider: String,
}

/// Seam for the order workflow; tests substitute a stub.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn get_payment(&self, reference: &str) -> Result<PaymentConfirmation, GatewayError>;
}

/// HTTP client for the real provider.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Unreachable)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn get_payment(&self, reference: &str) -> Result<PaymentConfirmation, GatewayError> {
        let url = format!("{}/payments/{}", self.base_url, reference);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(GatewayError::Unreachable)?;

        let status = response.status();
        let body = response.text().await.map_err(GatewayError::Unreachable)?;

        if status.is_client_error() {
            tracing::warn!(reference, status = status.as_u16(), "payment not found");
            return Err(GatewayError::PaymentNotFound {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(GatewayError::Unavailable {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<PaymentConfirmation>(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
    }
}
