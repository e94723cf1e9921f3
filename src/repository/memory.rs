use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::cart::Cart;
use crate::domain::catalog::{NewProduct, Product};
use crate::domain::order::{Order, OrderDetails, OrderItem, PaymentRecord};
use crate::domain::review::{NewReview, Review};
use crate::domain::user::{NewUser, User};
use crate::domain::{Page, Paged};

use super::{
    CartRepository, CommitError, OrderCommit, OrderRepository, ProductRepository,
    ReviewRepository, StorageResult, UserRepository,
};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Implements every repository trait over RwLock'd maps, for tests and
// development where persistence is not required. The order commit holds the
// write lock for its whole duration and stages stock decrements before
// applying anything, which gives it the same two properties as the Postgres
// transaction: concurrent commits are serialized, and a failed line leaves
// no partial effects behind.
//
// ============================================================================

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    products: HashMap<i64, Product>,
    carts: HashMap<i64, Cart>,
    orders: HashMap<i64, Order>,
    order_items: HashMap<i64, Vec<OrderItem>>,
    payments: HashMap<String, (i64, PaymentRecord)>,
    reviews: HashMap<(i64, i64), Review>,
    next_id: i64,
}

impl Inner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: the payment row linked to `order_id`, if any.
    pub fn payment_for_order(&self, order_id: i64) -> Option<PaymentRecord> {
        let inner = self.inner.read().expect("RwLock poisoned");
        inner
            .payments
            .values()
            .find(|(linked, _)| *linked == order_id)
            .map(|(_, record)| record.clone())
    }

    /// Test helper: number of persisted payment rows.
    pub fn payment_count(&self) -> usize {
        let inner = self.inner.read().expect("RwLock poisoned");
        inner.payments.len()
    }

    /// Test helper: number of persisted orders.
    pub fn order_count(&self) -> usize {
        let inner = self.inner.read().expect("RwLock poisoned");
        inner.orders.len()
    }
}

fn paginate<T>(items: Vec<T>, page: Page) -> Paged<T> {
    let total = items.len() as u64;
    let window = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Paged::from_items(window, page, total)
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Product>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.products.get(&id).cloned())
    }

    async fn insert(&self, new_product: NewProduct) -> StorageResult<Product> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let id = inner.alloc_id();
        let product = Product {
            id,
            name: new_product.name,
            description: new_product.description,
            unit_price: new_product.unit_price,
            stock_quantity: new_product.stock_quantity,
            category: new_product.category,
            size: new_product.size,
            shop_displayable: new_product.shop_displayable,
            avg_rating: 0.0,
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> StorageResult<()> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        Ok(inner.products.remove(&id).is_some())
    }

    async fn list(&self, page: Page) -> StorageResult<Paged<Product>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let mut items: Vec<Product> = inner.products.values().cloned().collect();
        items.sort_by_key(|p| p.id);
        Ok(paginate(items, page))
    }

    async fn list_displayable(&self, page: Page) -> StorageResult<Paged<Product>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let mut items: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.shop_displayable)
            .cloned()
            .collect();
        items.sort_by_key(|p| p.id);
        Ok(paginate(items, page))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.users.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.users.values().any(|u| u.email == email))
    }

    async fn insert(&self, new_user: NewUser) -> StorageResult<User> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let id = inner.alloc_id();
        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_by_user(&self, user_id: i64) -> StorageResult<Option<Cart>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner
            .carts
            .get(&user_id)
            .filter(|c| !c.is_empty())
            .cloned())
    }

    async fn save(&self, cart: &Cart) -> StorageResult<()> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        inner.carts.insert(cart.user_id, cart.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn commit_paid_order(&self, commit: OrderCommit) -> Result<i64, CommitError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");

        // stage every decrement before applying any of them
        let mut staged = Vec::with_capacity(commit.lines.len());
        for line in &commit.lines {
            let decremented = inner
                .products
                .get(&line.product_id)
                .and_then(|p| p.decremented(line.quantity));

            match decremented {
                Some(product) => staged.push(product),
                None => return Err(CommitError::OutOfStock(line.product_id)),
            }
        }

        let order_id = inner.alloc_id();
        for product in staged {
            inner.products.insert(product.id, product);
        }

        inner.orders.insert(
            order_id,
            Order {
                id: order_id,
                user_id: commit.user_id,
                total_price: commit.total_price,
                status: commit.status,
                created_at: commit.created_at,
            },
        );

        let items = commit
            .lines
            .iter()
            .map(|line| OrderItem {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        inner.order_items.insert(order_id, items);

        inner
            .payments
            .insert(commit.payment.payment_id.clone(), (order_id, commit.payment));

        Ok(order_id)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderDetails>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.orders.get(&id).map(|order| OrderDetails {
            order: order.clone(),
            items: inner.order_items.get(&id).cloned().unwrap_or_default(),
        }))
    }

    async fn list(&self, page: Page) -> StorageResult<Paged<Order>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let mut items: Vec<Order> = inner.orders.values().cloned().collect();
        items.sort_by_key(|o| o.id);
        Ok(paginate(items, page))
    }

    async fn delete(&self, id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        inner.order_items.remove(&id);
        Ok(inner.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn find_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> StorageResult<Option<Review>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.reviews.get(&(user_id, product_id)).cloned())
    }

    async fn list_by_product(&self, product_id: i64) -> StorageResult<Vec<Review>> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn insert(&self, new_review: NewReview) -> StorageResult<Review> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let id = inner.alloc_id();
        let review = Review {
            id,
            user_id: new_review.user_id,
            product_id: new_review.product_id,
            rating: new_review.rating,
            comment: new_review.comment,
            created_at: Utc::now(),
        };
        inner
            .reviews
            .insert((review.user_id, review.product_id), review.clone());
        Ok(review)
    }

    async fn update(&self, review: &Review) -> StorageResult<()> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        inner
            .reviews
            .insert((review.user_id, review.product_id), review.clone());
        Ok(())
    }

    async fn delete(&self, user_id: i64, product_id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        Ok(inner.reviews.remove(&(user_id, product_id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Category, ProductSize};
    use crate::domain::order::{OrderStatus, PreparedLine};

    fn new_product(unit_price: i64, stock: i32) -> NewProduct {
        NewProduct {
            name: "wool coat".to_string(),
            description: "double-breasted".to_string(),
            unit_price,
            stock_quantity: stock,
            category: Category::Outer,
            size: ProductSize::L,
            shop_displayable: true,
        }
    }

    fn payment(payment_id: &str) -> PaymentRecord {
        PaymentRecord {
            payment_id: payment_id.to_string(),
            transaction_id: "tx-1".to_string(),
            merchant_id: "merchant-1".to_string(),
            method_type: "PaymentMethodCard".to_string(),
            provider: "KAKAOPAY".to_string(),
            paid_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_applies_all_effects() {
        let store = MemoryStore::new();
        let product = ProductRepository::insert(&store, new_product(50_000, 10))
            .await
            .unwrap();

        let commit = OrderCommit {
            user_id: 1,
            total_price: 100_000,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
            lines: vec![PreparedLine {
                product_id: product.id,
                quantity: 2,
                price: 100_000,
            }],
            payment: payment("payment-1"),
        };

        let order_id = store.commit_paid_order(commit).await.unwrap();

        let stock = ProductRepository::find_by_id(&store, product.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity;
        assert_eq!(stock, 8);

        let details = OrderRepository::find_by_id(&store, order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.items.len(), 1);
        assert!(store.payment_for_order(order_id).is_some());
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let store = MemoryStore::new();
        let in_stock = ProductRepository::insert(&store, new_product(50_000, 10))
            .await
            .unwrap();
        let scarce = ProductRepository::insert(&store, new_product(30_000, 1))
            .await
            .unwrap();

        let commit = OrderCommit {
            user_id: 1,
            total_price: 160_000,
            status: OrderStatus::Paid,
            created_at: Utc::now(),
            lines: vec![
                PreparedLine {
                    product_id: in_stock.id,
                    quantity: 2,
                    price: 100_000,
                },
                PreparedLine {
                    product_id: scarce.id,
                    quantity: 2,
                    price: 60_000,
                },
            ],
            payment: payment("payment-2"),
        };

        let err = store.commit_paid_order(commit).await.unwrap_err();
        assert!(matches!(err, CommitError::OutOfStock(id) if id == scarce.id));

        // first line's decrement must not have leaked
        let stock = ProductRepository::find_by_id(&store, in_stock.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity;
        assert_eq!(stock, 10);
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.payment_count(), 0);
    }
}
