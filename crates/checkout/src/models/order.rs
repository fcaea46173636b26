//! Order and order line models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{OrderId, OrderLineId, OrderStatus, ProductId, UserId};

/// Durable record of a completed checkout.
///
/// Monetary values are frozen at creation; later product price or discount
/// changes never retroactively affect a historical order. Status changes
/// only through the lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Sum of the line subtotals, computed at checkout time.
    pub total: Decimal,
    pub shipping_address: String,
    /// Opaque payment method tag; real payment processing is out of scope.
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One product/quantity/price entry of an order. Immutable after creation;
/// created atomically with its parent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Discount-adjusted unit price snapshot taken at checkout time.
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Fields needed to persist a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Fields needed to persist one line of a new order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
