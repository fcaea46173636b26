//! Orchard Checkout - the order fulfillment transaction engine.
//!
//! This crate converts a shopping cart into a durable order while keeping
//! inventory correct under concurrent checkouts. It owns four pieces:
//!
//! - [`pricing`] - enriches cart lines with live product data and
//!   discount-adjusted totals, collecting availability problems
//! - [`ledger`] - atomic, race-safe stock primitives with automatic
//!   availability flips as stock crosses zero
//! - [`services::checkout`] - the checkout coordinator: validate, price,
//!   persist order and lines, decrement stock, and clear the cart as one
//!   unit of work
//! - [`services::lifecycle`] - the order state machine, including stock
//!   restoration on cancellation
//!
//! Everything above (catalog, rendering, sessions, payments) is an external
//! collaborator. The engine consumes user and product lookups through the
//! [`store::Store`] abstraction and persists order-related rows only.
//!
//! # Storage
//!
//! Components receive an injected [`store::Store`] handle rather than a
//! process-wide connection: [`store::PgStore`] for production,
//! [`store::MemoryStore`] for tests. Each checkout or cancellation opens a
//! single [`store::StoreTx`] and threads it through every order, line, and
//! stock operation; any failure rolls the whole attempt back.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod services;
pub mod store;

pub use config::StoreConfig;
pub use error::CheckoutError;
pub use services::cart::CartService;
pub use services::checkout::{CheckoutRequest, CheckoutService};
pub use services::lifecycle::LifecycleService;
