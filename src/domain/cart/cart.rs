use serde::{Deserialize, Serialize};

use crate::domain::catalog::Product;

// ============================================================================
// Cart Aggregate
// ============================================================================

/// One line of a cart. `subtotal` equals `quantity * unit price` as of the
/// last write to this line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

/// A user's cart. Owned 1:1 by the user; created lazily on first write.
///
/// Mutations are pure transitions returning the next cart value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: i64,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Set the line for `product` to an absolute `quantity`, replacing any
    /// existing quantity rather than adding to it. A quantity of zero or
    /// below drops the line entirely.
    pub fn with_line(mut self, product: &Product, quantity: i32) -> Self {
        if quantity <= 0 {
            return self.without_line(product.id);
        }

        let subtotal = product.line_price(quantity);
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = quantity;
                line.subtotal = subtotal;
            }
            None => self.lines.push(CartLine {
                product_id: product.id,
                quantity,
                subtotal,
            }),
        }
        self
    }

    /// Remove the line for `product_id`. Removing an absent line is a no-op.
    pub fn without_line(mut self, product_id: i64) -> Self {
        self.lines.retain(|l| l.product_id != product_id);
        self
    }

    pub fn line(&self, product_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
