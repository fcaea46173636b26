//! User model, as seen by the order engine.

use serde::{Deserialize, Serialize};

use orchard_core::UserId;

/// Minimal view of a user from the directory. The engine only needs
/// existence and active status; authentication lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub active: bool,
}
