use crate::gateway::GatewayError;
use crate::repository::{CommitError, StorageError};

// ============================================================================
// Order Business Rule Errors
// ============================================================================
//
// Everything here is recoverable from the caller's perspective (fix the
// input and retry) except `GatewayUnavailable`, which signals a transient
// infrastructure failure: retrying is safe only after checking whether the
// order already exists, since the gateway call is not idempotent.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i32 },

    #[error("claimed total {claimed} does not match computed total {computed}")]
    TotalPriceMismatch { claimed: i64, computed: i64 },

    #[error("payment {0} not found")]
    PaymentNotFound(String),

    #[error("payment gateway unavailable, retry later")]
    GatewayUnavailable(#[source] GatewayError),

    #[error("product {0} is out of stock")]
    OutOfStock(i64),

    #[error("order {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CommitError> for OrderError {
    fn from(error: CommitError) -> Self {
        match error {
            CommitError::OutOfStock(product_id) => OrderError::OutOfStock(product_id),
            CommitError::Storage(storage) => OrderError::Storage(storage),
        }
    }
}
