//! Cart item model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orchard_core::{ProductId, UserId};

/// One product/quantity selection in a user's cart.
///
/// Cart items are transient: mutated on add/update, destroyed on explicit
/// removal or successful checkout. A user holds at most one item per
/// product; adding the same product again accumulates quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}
