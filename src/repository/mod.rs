use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::cart::Cart;
use crate::domain::catalog::{NewProduct, Product};
use crate::domain::order::{Order, OrderDetails, OrderStatus, PaymentRecord, PreparedLine};
use crate::domain::review::{NewReview, Review};
use crate::domain::user::{NewUser, User};
use crate::domain::{Page, Paged};

// ============================================================================
// Storage Seam - Repository Traits
// ============================================================================
//
// Two implementations:
// - `postgres::PgStore` for production (sqlx, real transactions)
// - `memory::MemoryStore` for tests and development
//
// ============================================================================

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row no longer decodes into the domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The atomic unit persisted by a successful checkout: the paid order, its
/// line snapshots (whose quantities are also the stock decrements), and the
/// gateway-confirmed payment. All of it lands in one transaction or none of
/// it does.
#[derive(Debug, Clone)]
pub struct OrderCommit {
    pub user_id: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<PreparedLine>,
    pub payment: PaymentRecord,
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// A conditional stock decrement matched no row: the product's stock no
    /// longer covers the requested quantity. The transaction is rolled back.
    #[error("product {0} has insufficient stock")]
    OutOfStock(i64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Product>>;
    async fn insert(&self, new_product: NewProduct) -> StorageResult<Product>;
    async fn update(&self, product: &Product) -> StorageResult<()>;
    /// Returns false when no such product existed.
    async fn delete(&self, id: i64) -> StorageResult<bool>;
    async fn list(&self, page: Page) -> StorageResult<Paged<Product>>;
    async fn list_displayable(&self, page: Page) -> StorageResult<Paged<Product>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> StorageResult<bool>;
    async fn insert(&self, new_user: NewUser) -> StorageResult<User>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// `None` when the user has no cart yet (or an empty one; the two are
    /// indistinguishable and both read as "create lazily on next write").
    async fn find_by_user(&self, user_id: i64) -> StorageResult<Option<Cart>>;
    /// Replace the user's cart with `cart` in full.
    async fn save(&self, cart: &Cart) -> StorageResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a paid order atomically: order row, conditional stock
    /// decrements, item snapshots, payment row. Returns the new order id.
    async fn commit_paid_order(&self, commit: OrderCommit) -> Result<i64, CommitError>;
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderDetails>>;
    async fn list(&self, page: Page) -> StorageResult<Paged<Order>>;
    /// Deletes the order and its items; payment rows are kept as audit
    /// records. Returns false when no such order existed.
    async fn delete(&self, id: i64) -> StorageResult<bool>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> StorageResult<Option<Review>>;
    async fn list_by_product(&self, product_id: i64) -> StorageResult<Vec<Review>>;
    async fn insert(&self, new_review: NewReview) -> StorageResult<Review>;
    async fn update(&self, review: &Review) -> StorageResult<()>;
    async fn delete(&self, user_id: i64, product_id: i64) -> StorageResult<bool>;
}
