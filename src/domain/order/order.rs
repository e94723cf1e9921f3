use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::Product;

use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderStatus, PreparedLine};

// ============================================================================
// Order Entity and Pure Checkout Logic
// ============================================================================

/// A persisted order. Only ever written with status `Paid`; `total_price`
/// equals the sum of its items' line totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An order with its item snapshots, as returned by order reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// In-memory order state before commit. Never persisted standalone: the
/// draft either transitions to `Paid` and lands in the commit transaction,
/// or is dropped.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    pub fn new(user_id: i64, total_price: i64) -> Self {
        Self {
            user_id,
            total_price,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Transition to `Paid` after gateway confirmation.
    pub fn mark_paid(self) -> Self {
        Self {
            status: OrderStatus::Paid,
            ..self
        }
    }
}

/// Verify the client-claimed total against authoritative prices: subtract
/// every line's `unit price x quantity` from a running total seeded at
/// `claimed`; anything but an exact zero remainder is a mismatch.
pub fn reconcile_total(claimed: i64, lines: &[(Product, i32)]) -> Result<(), OrderError> {
    let mut remaining = claimed;
    for (product, quantity) in lines {
        remaining -= product.line_price(*quantity);
    }

    if remaining != 0 {
        return Err(OrderError::TotalPriceMismatch {
            claimed,
            computed: claimed - remaining,
        });
    }
    Ok(())
}

/// Capture line snapshots at the authoritative unit price.
pub fn prepare_lines(lines: &[(Product, i32)]) -> Vec<PreparedLine> {
    lines
        .iter()
        .map(|(product, quantity)| PreparedLine {
            product_id: product.id,
            quantity: *quantity,
            price: product.line_price(*quantity),
        })
        .collect()
}
