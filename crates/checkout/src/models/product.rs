//! Product model, as seen by the order engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{AvailabilityStatus, ProductId, discounted_unit_price};

/// Catalog product, read and written by this engine only for pricing,
/// stock, and availability. Everything else about a product belongs to the
/// catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Undiscounted unit price.
    pub price: Decimal,
    /// Whole-number percentage (`10` means 10% off).
    pub discount_percent: Decimal,
    pub stock: i32,
    pub status: AvailabilityStatus,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Unit price after the product's current discount.
    #[must_use]
    pub fn discounted_price(&self) -> Decimal {
        discounted_unit_price(self.price, self.discount_percent)
    }
}
