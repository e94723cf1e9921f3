use crate::repository::StorageError;

// ============================================================================
// Catalog Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(i64),

    #[error("unit price must be positive, got {0}")]
    InvalidPrice(i64),

    #[error("stock quantity must be non-negative, got {0}")]
    InvalidStock(i32),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
