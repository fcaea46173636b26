//! Orchard Core - Shared types library.
//!
//! This crate provides common types used across the Orchard order engine:
//! - `checkout` - Cart pricing, the checkout transaction, and the order lifecycle
//! - `integration-tests` - End-to-end tests against the in-memory store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no async.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, discount arithmetic, and status enumerations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
