//! The order lifecycle state machine.
//!
//! Enforces the legal status transitions on stored orders and drives the
//! compensating stock restoration on cancellation. The transition table
//! itself lives on [`OrderStatus`]; this service applies it transactionally
//! so an illegal attempt leaves the stored state untouched.

use std::sync::Arc;

use tracing::instrument;

use orchard_core::{OrderId, OrderStatus};

use crate::error::CheckoutError;
use crate::ledger;
use crate::models::{Order, OrderLine};
use crate::store::{Store, StoreTx};

/// Applies lifecycle transitions to stored orders.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn Store>,
}

impl LifecycleService {
    /// Create a service over an injected store handle.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Move an order to a new status.
    ///
    /// Moving to [`OrderStatus::Cancelled`] restores the stock of every
    /// line exactly once, atomically with the status flip.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] for unknown orders,
    /// [`CheckoutError::AlreadyCancelled`] when cancelling twice,
    /// [`CheckoutError::InvalidTransition`] for everything the transition
    /// table forbids, and [`CheckoutError::OperationFailed`] on storage
    /// failure (after a full rollback).
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;
        match run_transition(tx.as_mut(), order_id, to).await {
            Ok(order) => {
                tx.commit().await?;
                tracing::info!(%order_id, status = %to, "order status changed");
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Cancel an order, restoring its line quantities to stock.
    ///
    /// Legal from every state except `CANCELLED` itself; cancelling a
    /// delivered order models a post-delivery return.
    ///
    /// # Errors
    ///
    /// As [`Self::set_status`] with [`OrderStatus::Cancelled`].
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, CheckoutError> {
        self.set_status(order_id, OrderStatus::Cancelled).await
    }

    /// Current status of an order, for display.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] or
    /// [`CheckoutError::OperationFailed`].
    pub async fn order_status(&self, order_id: OrderId) -> Result<OrderStatus, CheckoutError> {
        Ok(self.load(order_id).await?.0.status)
    }

    /// An order together with its line items.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] or
    /// [`CheckoutError::OperationFailed`].
    pub async fn order_with_lines(
        &self,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderLine>), CheckoutError> {
        self.load(order_id).await
    }

    async fn load(&self, order_id: OrderId) -> Result<(Order, Vec<OrderLine>), CheckoutError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let order = tx
                .find_order(order_id)
                .await?
                .ok_or(CheckoutError::OrderNotFound(order_id))?;
            let lines = tx.order_lines(order_id).await?;
            Ok((order, lines))
        }
        .await;
        // Read-only; discard the transaction either way.
        let _ = tx.rollback().await;
        result
    }
}

/// Validate and apply one transition inside an open transaction.
async fn run_transition(
    tx: &mut dyn StoreTx,
    order_id: OrderId,
    to: OrderStatus,
) -> Result<Order, CheckoutError> {
    let order = tx
        .find_order(order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(order_id))?;

    if to == OrderStatus::Cancelled && order.status == OrderStatus::Cancelled {
        // Fail fast so stock is never credited twice.
        return Err(CheckoutError::AlreadyCancelled(order_id));
    }
    if !order.status.can_transition_to(to) {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    if to == OrderStatus::Cancelled {
        for line in tx.order_lines(order_id).await? {
            ledger::restore_stock(&mut *tx, line.product_id, line.quantity).await?;
        }
    }

    tx.update_order_status(order_id, to).await?;

    Ok(Order {
        status: to,
        ..order
    })
}
