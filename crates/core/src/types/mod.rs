//! Core types for the Orchard order engine.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{discounted_unit_price, line_discount, line_subtotal};
pub use status::{AvailabilityStatus, OrderStatus, StatusParseError};
