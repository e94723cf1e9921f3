use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Page, Paged};
use crate::gateway::{GatewayError, PaymentConfirmation, PaymentGateway};
use crate::repository::{OrderCommit, OrderRepository, ProductRepository, UserRepository};
use crate::utils::{retry_on_transient, RetryConfig, RetryResult};

use super::errors::OrderError;
use super::order::{prepare_lines, reconcile_total, Order, OrderDetails, OrderDraft};
use super::value_objects::PaymentRecord;

// ============================================================================
// Order Workflow
// ============================================================================
//
// PlaceOrder runs in two phases:
//   1-3. read-only validation: user, price reconciliation, gateway
//        confirmation - no durable state is touched, any failure leaves
//        nothing behind;
//   4.   commit: order row, stock decrements, item snapshots, and the
//        payment row land in one transaction or not at all.
//
// ============================================================================

/// A submitted checkout: the claimed total and the (product -> quantity)
/// map, as posted by the client.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub user_id: i64,
    pub total_price: i64,
    pub products: BTreeMap<i64, i32>,
}

pub struct OrderWorkflow {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    retry: RetryConfig,
}

impl OrderWorkflow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            users,
            products,
            orders,
            gateway,
            retry: RetryConfig::default(),
        }
    }

    /// Override the gateway retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Verify the payment identified by `payment_reference` and create the
    /// order. Returns the new order's id.
    pub async fn place_order(
        &self,
        payment_reference: &str,
        request: PlaceOrderRequest,
    ) -> Result<i64, OrderError> {
        // 1. user validation
        let user = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or(OrderError::UserNotFound(request.user_id))?;

        // 2. price reconciliation against authoritative prices
        let mut resolved = Vec::with_capacity(request.products.len());
        for (&product_id, &quantity) in &request.products {
            if quantity < 1 {
                return Err(OrderError::InvalidQuantity {
                    product_id,
                    quantity,
                });
            }

            let product = self
                .products
                .find_by_id(product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(product_id))?;
            resolved.push((product, quantity));
        }
        reconcile_total(request.total_price, &resolved)?;

        // 3. gateway confirmation - only after local validation passed
        let confirmation = self.confirm_payment(payment_reference).await?;

        // 4. atomic commit: order, stock decrements, items, payment
        let draft = OrderDraft::new(user.id, request.total_price).mark_paid();
        let commit = OrderCommit {
            user_id: draft.user_id,
            total_price: draft.total_price,
            status: draft.status,
            created_at: draft.created_at,
            lines: prepare_lines(&resolved),
            payment: PaymentRecord::from_confirmation(confirmation),
        };

        let order_id = self.orders.commit_paid_order(commit).await?;

        tracing::info!(
            order_id,
            user_id = user.id,
            total_price = request.total_price,
            line_count = resolved.len(),
            "✅ order placed"
        );
        Ok(order_id)
    }

    async fn confirm_payment(
        &self,
        reference: &str,
    ) -> Result<PaymentConfirmation, OrderError> {
        let outcome = retry_on_transient(self.retry.clone(), |_attempt| {
            self.gateway.get_payment(reference)
        })
        .await;

        match outcome {
            RetryResult::Success(confirmation) => Ok(confirmation),
            RetryResult::PermanentFailure(GatewayError::PaymentNotFound { .. }) => {
                Err(OrderError::PaymentNotFound(reference.to_string()))
            }
            RetryResult::PermanentFailure(error) | RetryResult::Failed(error) => {
                Err(OrderError::GatewayUnavailable(error))
            }
        }
    }

    pub async fn get_order(&self, id: i64) -> Result<OrderDetails, OrderError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    pub async fn list_orders(&self, page: Page) -> Result<Paged<Order>, OrderError> {
        Ok(self.orders.list(page).await?)
    }

    /// Delete an order and, by ownership, its items. The payment row is an
    /// audit record and survives.
    pub async fn delete_order(&self, id: i64) -> Result<(), OrderError> {
        if !self.orders.delete(id).await? {
            return Err(OrderError::NotFound(id));
        }
        tracing::info!(order_id = id, "order deleted");
        Ok(())
    }
}
