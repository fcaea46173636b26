//! Domain models for the order engine.
//!
//! These are plain data structures; persistence lives in [`crate::store`].

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartItem;
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use product::Product;
pub use user::User;
