#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use storefront_core::domain::catalog::{Category, NewProduct, Product, ProductSize};
use storefront_core::domain::user::{NewUser, User};
use storefront_core::gateway::{
    GatewayError, PaymentConfirmation, PaymentGateway, PaymentMethod,
};
use storefront_core::repository::{MemoryStore, ProductRepository, UserRepository};

// ============================================================================
// Shared Test Fixtures
// ============================================================================

pub fn confirmation(reference: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        id: reference.to_string(),
        status: "PAID".to_string(),
        transaction_id: "0192e18e-152c-33d8-3a0a-6a88e0eb17b6".to_string(),
        merchant_id: "merchant-a633191f-848d-41f3-9621-128f52d3b187".to_string(),
        method: PaymentMethod {
            method_type: "PaymentMethodEasyPay".to_string(),
            provider: "KAKAOPAY".to_string(),
        },
        paid_at: Utc::now(),
    }
}

/// What the stub gateway should answer with.
pub enum StubMode {
    Confirm,
    NotFound,
    Unavailable,
}

/// Scriptable gateway standing in for the external provider. Counts calls
/// so tests can assert that validation failures never reach the gateway and
/// that transient failures are retried.
pub struct StubGateway {
    mode: StubMode,
    calls: AtomicU32,
}

impl StubGateway {
    pub fn confirming() -> Self {
        Self {
            mode: StubMode::Confirm,
            calls: AtomicU32::new(0),
        }
    }

    pub fn not_found() -> Self {
        Self {
            mode: StubMode::NotFound,
            calls: AtomicU32::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: StubMode::Unavailable,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn get_payment(&self, reference: &str) -> Result<PaymentConfirmation, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StubMode::Confirm => Ok(confirmation(reference)),
            StubMode::NotFound => Err(GatewayError::PaymentNotFound {
                reference: reference.to_string(),
                status: 404,
            }),
            StubMode::Unavailable => Err(GatewayError::Unavailable {
                status: 503,
                body: "upstream timeout".to_string(),
            }),
        }
    }
}

pub async fn seed_user(store: &MemoryStore) -> User {
    UserRepository::insert(
        store,
        NewUser {
            name: "ILYA".to_string(),
            email: "test123@gmail.com".to_string(),
            phone_number: "010-1234-1234".to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_product(
    store: &MemoryStore,
    name: &str,
    unit_price: i64,
    stock_quantity: i32,
) -> Product {
    ProductRepository::insert(
        store,
        NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            unit_price,
            stock_quantity,
            category: Category::Outer,
            size: ProductSize::M,
            shop_displayable: true,
        },
    )
    .await
    .unwrap()
}

pub async fn stock_of(store: &MemoryStore, product_id: i64) -> i32 {
    ProductRepository::find_by_id(store, product_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

pub fn arc_store(store: &MemoryStore) -> Arc<MemoryStore> {
    Arc::new(store.clone())
}
