use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::cart::{Cart, CartLine};
use crate::domain::catalog::{Category, NewProduct, Product, ProductSize};
use crate::domain::order::{Order, OrderDetails, OrderItem, OrderStatus};
use crate::domain::review::{NewReview, Review};
use crate::domain::user::{NewUser, User};
use crate::domain::{Page, Paged};

use super::{
    CartRepository, CommitError, OrderCommit, OrderRepository, ProductRepository,
    ReviewRepository, StorageError, StorageResult, UserRepository,
};

// ============================================================================
// Postgres Store
// ============================================================================
//
// One store struct implements every repository trait over a shared pool.
// The checkout commit is the only multi-statement write path with business
// meaning: the conditional stock decrement closes the read-check-write race
// (two concurrent checkouts of the last unit cannot both match
// `stock_quantity >= $2`), and a zero affected-row count aborts the whole
// transaction.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id      BIGSERIAL PRIMARY KEY,
        name         TEXT NOT NULL,
        email        TEXT NOT NULL UNIQUE,
        phone_number TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        product_id       BIGSERIAL PRIMARY KEY,
        name             TEXT NOT NULL,
        description      TEXT NOT NULL,
        unit_price       BIGINT NOT NULL CHECK (unit_price > 0),
        stock_quantity   INTEGER NOT NULL CHECK (stock_quantity >= 0),
        category         TEXT NOT NULL,
        product_size     TEXT NOT NULL,
        shop_displayable BOOLEAN NOT NULL,
        avg_rating       REAL NOT NULL DEFAULT 0,
        created_at       TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cart_lines (
        user_id    BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
        product_id BIGINT NOT NULL REFERENCES products (product_id) ON DELETE CASCADE,
        quantity   INTEGER NOT NULL CHECK (quantity >= 1),
        subtotal   BIGINT NOT NULL,
        PRIMARY KEY (user_id, product_id)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        order_id     BIGSERIAL PRIMARY KEY,
        user_id      BIGINT NOT NULL REFERENCES users (user_id),
        total_price  BIGINT NOT NULL,
        order_status TEXT NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_items (
        order_item_id BIGSERIAL PRIMARY KEY,
        order_id      BIGINT NOT NULL REFERENCES orders (order_id) ON DELETE CASCADE,
        product_id    BIGINT NOT NULL REFERENCES products (product_id),
        quantity      INTEGER NOT NULL,
        price         BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS payments (
        payment_id          TEXT PRIMARY KEY,
        transaction_id      TEXT NOT NULL,
        merchant_id         TEXT NOT NULL,
        order_id            BIGINT NOT NULL,
        payment_method_type TEXT NOT NULL,
        provider            TEXT NOT NULL,
        paid_at             TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        review_id  BIGSERIAL PRIMARY KEY,
        user_id    BIGINT NOT NULL REFERENCES users (user_id),
        product_id BIGINT NOT NULL REFERENCES products (product_id) ON DELETE CASCADE,
        rating     REAL NOT NULL,
        comment    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        UNIQUE (user_id, product_id)
    )",
];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create any missing tables. Idempotent.
    pub async fn init_schema(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("schema ready");
        Ok(())
    }
}

fn product_from_row(row: &PgRow) -> StorageResult<Product> {
    let category: String = row.try_get("category")?;
    let size: String = row.try_get("product_size")?;

    Ok(Product {
        id: row.try_get("product_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        unit_price: row.try_get("unit_price")?,
        stock_quantity: row.try_get("stock_quantity")?,
        category: Category::parse(&category)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown category {category}")))?,
        size: ProductSize::parse(&size)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown product size {size}")))?,
        shop_displayable: row.try_get("shop_displayable")?,
        avg_rating: row.try_get("avg_rating")?,
        created_at: row.try_get("created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> StorageResult<Order> {
    let status: String = row.try_get("order_status")?;

    Ok(Order {
        id: row.try_get("order_id")?,
        user_id: row.try_get("user_id")?,
        total_price: row.try_get("total_price")?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown order status {status}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> StorageResult<User> {
    Ok(User {
        id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        created_at: row.try_get("created_at")?,
    })
}

fn review_from_row(row: &PgRow) -> StorageResult<Review> {
    Ok(Review {
        id: row.try_get("review_id")?,
        user_id: row.try_get("user_id")?,
        product_id: row.try_get("product_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE product_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn insert(&self, new_product: NewProduct) -> StorageResult<Product> {
        let row = sqlx::query(
            "INSERT INTO products
                 (name, description, unit_price, stock_quantity, category,
                  product_size, shop_displayable, avg_rating, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, now())
             RETURNING *",
        )
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.unit_price)
        .bind(new_product.stock_quantity)
        .bind(new_product.category.as_str())
        .bind(new_product.size.as_str())
        .bind(new_product.shop_displayable)
        .fetch_one(&self.pool)
        .await?;

        product_from_row(&row)
    }

    async fn update(&self, product: &Product) -> StorageResult<()> {
        sqlx::query(
            "UPDATE products
             SET name = $2, description = $3, unit_price = $4, stock_quantity = $5,
                 category = $6, product_size = $7, shop_displayable = $8, avg_rating = $9
             WHERE product_id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price)
        .bind(product.stock_quantity)
        .bind(product.category.as_str())
        .bind(product.size.as_str())
        .bind(product.shop_displayable)
        .bind(product.avg_rating)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: Page) -> StorageResult<Paged<Product>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM products")
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let rows = sqlx::query(
            "SELECT * FROM products ORDER BY product_id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Paged::from_items(items, page, total as u64))
    }

    async fn list_displayable(&self, page: Page) -> StorageResult<Paged<Product>> {
        let total: i64 =
            sqlx::query("SELECT COUNT(*) AS total FROM products WHERE shop_displayable")
                .fetch_one(&self.pool)
                .await?
                .try_get("total")?;

        let rows = sqlx::query(
            "SELECT * FROM products WHERE shop_displayable
             ORDER BY product_id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Paged::from_items(items, page, total as u64))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, new_user: NewUser) -> StorageResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (name, email, phone_number, created_at)
             VALUES ($1, $2, $3, now())
             RETURNING *",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone_number)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_by_user(&self, user_id: i64) -> StorageResult<Option<Cart>> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, subtotal FROM cart_lines
             WHERE user_id = $1 ORDER BY product_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            lines.push(CartLine {
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                subtotal: row.try_get("subtotal")?,
            });
        }
        Ok(Some(Cart { user_id, lines }))
    }

    async fn save(&self, cart: &Cart) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(cart.user_id)
            .execute(&mut *tx)
            .await?;

        for line in &cart.lines {
            sqlx::query(
                "INSERT INTO cart_lines (user_id, product_id, quantity, subtotal)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(cart.user_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn commit_paid_order(&self, commit: OrderCommit) -> Result<i64, CommitError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let order_id: i64 = sqlx::query(
            "INSERT INTO orders (user_id, total_price, order_status, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING order_id",
        )
        .bind(commit.user_id)
        .bind(commit.total_price)
        .bind(commit.status.as_str())
        .bind(commit.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::from)?
        .try_get("order_id")
        .map_err(StorageError::from)?;

        for line in &commit.lines {
            // conditional decrement: matches only while stock still covers
            // the quantity, so concurrent commits cannot drive stock negative
            let decremented = sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $2
                 WHERE product_id = $1 AND stock_quantity >= $2",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            if decremented.rows_affected() == 0 {
                tx.rollback().await.map_err(StorageError::from)?;
                tracing::warn!(
                    product_id = line.product_id,
                    quantity = line.quantity,
                    "stock check failed at commit, rolled back"
                );
                return Err(CommitError::OutOfStock(line.product_id));
            }

            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        }

        sqlx::query(
            "INSERT INTO payments
                 (payment_id, transaction_id, merchant_id, order_id,
                  payment_method_type, provider, paid_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&commit.payment.payment_id)
        .bind(&commit.payment.transaction_id)
        .bind(&commit.payment.merchant_id)
        .bind(order_id)
        .bind(&commit.payment.method_type)
        .bind(&commit.payment.provider)
        .bind(commit.payment.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;

        tracing::info!(
            order_id,
            user_id = commit.user_id,
            line_count = commit.lines.len(),
            "order commit persisted"
        );
        Ok(order_id)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderDetails>> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let order = match row.as_ref().map(order_from_row).transpose()? {
            Some(order) => order,
            None => return Ok(None),
        };

        let item_rows = sqlx::query(
            "SELECT order_id, product_id, quantity, price FROM order_items
             WHERE order_id = $1 ORDER BY order_item_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            items.push(OrderItem {
                order_id: row.try_get("order_id")?,
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
                price: row.try_get("price")?,
            });
        }

        Ok(Some(OrderDetails { order, items }))
    }

    async fn list(&self, page: Page) -> StorageResult<Paged<Order>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM orders")
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let rows = sqlx::query("SELECT * FROM orders ORDER BY order_id LIMIT $1 OFFSET $2")
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(order_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Paged::from_items(items, page, total as u64))
    }

    async fn delete(&self, id: i64) -> StorageResult<bool> {
        // items go with the order; payments are audit records and stay
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn find_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> StorageResult<Option<Review>> {
        let row = sqlx::query("SELECT * FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn list_by_product(&self, product_id: i64) -> StorageResult<Vec<Review>> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE product_id = $1 ORDER BY review_id")
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(review_from_row).collect()
    }

    async fn insert(&self, new_review: NewReview) -> StorageResult<Review> {
        let row = sqlx::query(
            "INSERT INTO reviews (user_id, product_id, rating, comment, created_at)
             VALUES ($1, $2, $3, $4, now())
             RETURNING *",
        )
        .bind(new_review.user_id)
        .bind(new_review.product_id)
        .bind(new_review.rating)
        .bind(&new_review.comment)
        .fetch_one(&self.pool)
        .await?;

        review_from_row(&row)
    }

    async fn update(&self, review: &Review) -> StorageResult<()> {
        sqlx::query("UPDATE reviews SET rating = $2, comment = $3 WHERE review_id = $1")
            .bind(review.id)
            .bind(review.rating)
            .bind(&review.comment)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, user_id: i64, product_id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
