use crate::repository::StorageError;

// ============================================================================
// Cart Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("product {product_id} has {available} in stock, {requested} requested")]
    OutOfStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
