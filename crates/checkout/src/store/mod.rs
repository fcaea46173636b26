//! Storage abstraction for the order engine.
//!
//! Components receive an injected [`Store`] handle instead of a
//! process-wide connection object. A [`StoreTx`] is one database
//! transaction: the checkout coordinator opens it once, threads it through
//! every order, line, and stock operation, and closes it exactly once.
//!
//! Two implementations exist:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx, the production store
//! - [`MemoryStore`] - in-memory substitution for tests
//!
//! Mutual exclusion for the stock invariant is delegated entirely to the
//! store: [`StoreTx::decrement_stock`] is a single atomically-evaluated
//! compare-and-update, never a separate read followed by a write.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use orchard_core::{AvailabilityStatus, OrderId, OrderStatus, ProductId, UserId};

use crate::models::{CartItem, NewOrder, NewOrderLine, Order, OrderLine, Product, User};

pub use memory::MemoryStore;
pub use postgres::{PgStore, create_pool, run_migrations};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid (e.g. an unknown status
    /// value in a status column).
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Handle to the relational store backing the order engine.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a connection cannot be acquired.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One open transaction against the store.
///
/// Reads observe the transaction's own uncommitted writes. Dropping a
/// transaction without calling [`StoreTx::commit`] discards every write
/// made through it.
#[async_trait]
pub trait StoreTx: Send {
    // -- user directory (read-only collaborator) --

    /// Look up a user by id.
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    // -- product catalog --

    /// Look up a product by id.
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Conditionally subtract `quantity` from the product's stock.
    ///
    /// The update applies only if `stock >= quantity` holds at write time,
    /// evaluated atomically by the store. Returns the remaining stock when
    /// the decrement took effect, `None` when it did not (insufficient
    /// stock or no such product).
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError>;

    /// Unconditionally add `quantity` to the product's stock.
    ///
    /// Returns the new stock value, or `None` if the product no longer
    /// exists.
    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError>;

    /// Overwrite the product's availability status.
    async fn set_availability(
        &mut self,
        id: ProductId,
        status: AvailabilityStatus,
    ) -> Result<(), StoreError>;

    // -- cart --

    /// All cart items belonging to a user, oldest first.
    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError>;

    /// Insert a cart item, accumulating quantity if the user already has
    /// one for this product.
    async fn upsert_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError>;

    /// Replace the quantity of an existing cart item. Returns `false` if
    /// the user has no item for this product.
    async fn set_cart_quantity(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, StoreError>;

    /// Remove one cart item. Returns `false` if there was none.
    async fn remove_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, StoreError>;

    /// Remove every cart item belonging to the user.
    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), StoreError>;

    // -- orders --

    /// Persist a new order row, returning it with its assigned id.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, StoreError>;

    /// Persist all lines of a new order.
    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError>;

    /// Look up an order by id.
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All lines of an order.
    async fn order_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError>;

    /// Overwrite the order's status.
    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError>;

    // -- transaction boundary --

    /// Make every write of this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
