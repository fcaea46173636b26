//! Unified error type for the order engine.
//!
//! Every storage-touching operation translates low-level failures into one
//! of these categories before returning, so callers above the engine never
//! interpret raw storage errors. Validation and business-rule variants are
//! caller-facing and never logged as operational failures; storage failures
//! are logged with full context and surfaced as [`CheckoutError::OperationFailed`].
//! No automatic retries exist anywhere in the engine.

use thiserror::Error;

use orchard_core::{AvailabilityStatus, OrderId, OrderStatus, ProductId, UserId};

use crate::store::StoreError;

/// Failure reasons produced by the order engine.
#[derive(Debug, Error)]
pub enum CheckoutError {
    // -- validation, resolved at the boundary --
    /// Checkout requested with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Shipping address missing or blank.
    #[error("shipping address is required")]
    MissingAddress,

    /// Payment method tag missing or blank.
    #[error("payment method is required")]
    MissingPaymentMethod,

    /// Payment method tag is not a recognizable tag.
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// Cart quantity must be positive.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    // -- not found, no retry attempted --
    /// No such (active) user.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// No such product.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// No such order.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    // -- business rules, carrying context for the caller --
    /// Product exists but cannot currently be sold.
    #[error("product {product_id} is not available ({status})")]
    Unavailable {
        product_id: ProductId,
        status: AvailabilityStatus,
    },

    /// Requested quantity exceeds the stock present at write time.
    #[error("insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The requested status change is not a legal transition.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order was already cancelled; stock must not be credited twice.
    #[error("order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    // -- storage/transport, after a full rollback --
    /// A storage-level failure; details are logged, not surfaced.
    #[error("operation failed")]
    OperationFailed,
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        Self::OperationFailed
    }
}
