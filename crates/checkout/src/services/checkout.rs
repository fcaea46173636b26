//! The order transaction coordinator.
//!
//! Converts a user's cart into a durable order as a single unit of work:
//! resolve the user, load and price the cart, persist the order and its
//! lines, conditionally decrement stock per line, and clear the cart. Any
//! failure at any step rolls back everything written in the attempt,
//! including stock already decremented for earlier lines - no partial
//! order is ever visible outside the transaction.
//!
//! There is no blocking, queueing, or internal retry: stock contention
//! fails immediately with the context the caller needs to decide whether
//! to retry.

use std::sync::Arc;

use tracing::instrument;

use orchard_core::{OrderId, OrderStatus, UserId};

use crate::error::CheckoutError;
use crate::models::{NewOrder, NewOrderLine};
use crate::store::{Store, StoreTx};
use crate::{ledger, pricing};

/// Maximum accepted length of a payment method tag.
const MAX_PAYMENT_TAG_LEN: usize = 32;

/// Everything the caller supplies to place an order.
///
/// The payment method is an opaque tag; real payment processing happens
/// outside this engine.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Boundary validation, resolved before any transaction opens.
    fn validate(&self) -> Result<(), CheckoutError> {
        if self.shipping_address.trim().is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        let tag = self.payment_method.trim();
        if tag.is_empty() {
            return Err(CheckoutError::MissingPaymentMethod);
        }
        let well_formed = tag.len() <= MAX_PAYMENT_TAG_LEN
            && tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !well_formed {
            return Err(CheckoutError::InvalidPaymentMethod(
                self.payment_method.clone(),
            ));
        }
        Ok(())
    }
}

/// Coordinates the checkout transaction.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn Store>,
}

impl CheckoutService {
    /// Create a service over an injected store handle.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Place an order from the user's current cart.
    ///
    /// Either returns the new order id, or fails with no observable side
    /// effects.
    ///
    /// # Errors
    ///
    /// Validation: [`CheckoutError::MissingAddress`],
    /// [`CheckoutError::MissingPaymentMethod`],
    /// [`CheckoutError::InvalidPaymentMethod`], [`CheckoutError::EmptyCart`].
    /// Not-found: [`CheckoutError::UserNotFound`],
    /// [`CheckoutError::ProductNotFound`]. Business rules:
    /// [`CheckoutError::Unavailable`], [`CheckoutError::InsufficientStock`].
    /// Storage failures surface as [`CheckoutError::OperationFailed`] after
    /// a full rollback.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn place_order(&self, request: &CheckoutRequest) -> Result<OrderId, CheckoutError> {
        request.validate()?;

        let mut tx = self.store.begin().await?;
        match run_checkout(tx.as_mut(), request).await {
            Ok(order_id) => {
                tx.commit().await?;
                tracing::info!(%order_id, "order placed");
                Ok(order_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Steps 1-7 of the checkout sequence, inside an already-open transaction.
async fn run_checkout(
    tx: &mut dyn StoreTx,
    request: &CheckoutRequest,
) -> Result<OrderId, CheckoutError> {
    // 1. Resolve the user; inactive users are treated as absent.
    let user = tx
        .find_user(request.user_id)
        .await?
        .filter(|u| u.active)
        .ok_or(CheckoutError::UserNotFound(request.user_id))?;

    // 2. Load the cart.
    let items = tx.cart_items(user.id).await?;
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    // 3. Price every line; here a problem aborts instead of flagging.
    let cart = pricing::price_cart(&mut *tx, &items).await?;
    if let Some(problem) = cart.problems.into_iter().next() {
        return Err(problem.into());
    }

    // 4. Persist the order with the total frozen at this moment.
    let order = tx
        .insert_order(&NewOrder {
            user_id: user.id,
            status: OrderStatus::Pending,
            total: cart.grand_total,
            shipping_address: request.shipping_address.trim().to_string(),
            payment_method: request.payment_method.trim().to_string(),
            notes: request.notes.clone(),
        })
        .await?;

    // 5. Persist all lines with their price snapshots.
    let lines: Vec<NewOrderLine> = cart
        .lines
        .iter()
        .map(|l| NewOrderLine {
            product_id: l.product_id,
            quantity: l.quantity,
            unit_price: l.discounted_unit_price,
            subtotal: l.subtotal,
        })
        .collect();
    tx.insert_order_lines(order.id, &lines).await?;

    // 6. Conditional decrement per line. The store's compare-and-update is
    //    the sole authority for the stock invariant; a concurrent checkout
    //    may have consumed the units validation saw in step 3.
    for line in &lines {
        ledger::decrement_stock(&mut *tx, line.product_id, line.quantity).await?;
    }

    // 7. Drain the cart only after every decrement succeeded.
    tx.clear_cart(user.id).await?;

    Ok(order.id)
}
