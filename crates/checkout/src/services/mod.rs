//! Services exposed by the order engine.
//!
//! Each service holds an injected [`crate::store::Store`] handle and opens
//! one transaction per operation.

pub mod cart;
pub mod checkout;
pub mod lifecycle;

pub use cart::CartService;
pub use checkout::{CheckoutRequest, CheckoutService};
pub use lifecycle::LifecycleService;
