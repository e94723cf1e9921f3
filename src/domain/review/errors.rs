use crate::repository::StorageError;

// ============================================================================
// Review Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("user {user_id} already reviewed product {product_id}")]
    AlreadyExists { user_id: i64, product_id: i64 },

    #[error("no review by user {user_id} for product {product_id}")]
    NotFound { user_id: i64, product_id: i64 },

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(f32),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
