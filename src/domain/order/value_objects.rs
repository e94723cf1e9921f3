use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::PaymentConfirmation;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order lifecycle. `Pending` exists only in memory; a persisted order is
/// always `Paid`. `Failed` is reserved for a future gateway-driven
/// compensation path and is currently never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "PAID" => Some(OrderStatus::Paid),
            "FAILED" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

/// Snapshot of one purchased line, captured at order time and never updated
/// afterward. `price` is the line total, quantity x unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
}

/// A validated line ready for commit: quantity plus the line total computed
/// from the authoritative unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedLine {
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
}

/// Payment facts as confirmed by the gateway, keyed by the gateway's payment
/// id. Persisted once per successful checkout; kept as an audit record even
/// if the order is later deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub transaction_id: String,
    pub merchant_id: String,
    pub method_type: String,
    pub provider: String,
    pub paid_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn from_confirmation(confirmation: PaymentConfirmation) -> Self {
        Self {
            payment_id: confirmation.id,
            transaction_id: confirmation.transaction_id,
            merchant_id: confirmation.merchant_id,
            method_type: confirmation.method.method_type,
            provider: confirmation.method.provider,
            paid_at: confirmation.paid_at,
        }
    }
}
