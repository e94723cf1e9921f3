use std::sync::Arc;

use crate::repository::{CartRepository, ProductRepository, UserRepository};

use super::cart::Cart;
use super::errors::CartError;

// ============================================================================
// Cart Service
// ============================================================================
//
// Validation order mirrors checkout: product first (existence, stock), then
// user, then the lazily-created cart.
//
// ============================================================================

pub struct CartService {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
    ) -> Self {
        Self {
            users,
            products,
            carts,
        }
    }

    /// Set the user's line for `product_id` to an absolute `quantity`.
    /// A quantity of zero or below removes the line. No stock is decremented
    /// here; the check only guards against carting more than is available.
    pub async fn update_line_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<(), CartError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        if quantity > 0 && !product.has_stock_for(quantity) {
            return Err(CartError::OutOfStock {
                product_id,
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CartError::UserNotFound(user_id))?;

        let cart = self
            .carts
            .find_by_user(user.id)
            .await?
            .unwrap_or_else(|| Cart::empty(user.id));

        let cart = cart.with_line(&product, quantity);
        self.carts.save(&cart).await?;

        tracing::debug!(
            user_id = user.id,
            product_id,
            quantity,
            "cart line updated"
        );
        Ok(())
    }

    /// Remove the user's line for `product_id`. Removing a line that is not
    /// in the cart is a no-op, not an error.
    pub async fn remove_line(&self, user_id: i64, product_id: i64) -> Result<(), CartError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CartError::UserNotFound(user_id))?;

        let cart = self
            .carts
            .find_by_user(user.id)
            .await?
            .unwrap_or_else(|| Cart::empty(user.id));

        let cart = cart.without_line(product.id);
        self.carts.save(&cart).await?;

        tracing::debug!(user_id = user.id, product_id, "cart line removed");
        Ok(())
    }

    /// Current cart contents; an absent cart reads as empty.
    pub async fn get_cart(&self, user_id: i64) -> Result<Cart, CartError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CartError::UserNotFound(user_id))?;

        Ok(self
            .carts
            .find_by_user(user.id)
            .await?
            .unwrap_or_else(|| Cart::empty(user.id)))
    }
}
