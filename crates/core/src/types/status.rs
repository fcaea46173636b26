//! Status enumerations for orders and products.
//!
//! Statuses are closed sets: the storage layer parses stored text through
//! `FromStr` and rejects unknown values instead of propagating them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored status value that does not belong to the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct StatusParseError {
    kind: &'static str,
    value: String,
}

/// Order lifecycle status.
///
/// The legal forward path is strictly sequential:
/// `Pending → Processing → Shipped → Delivered`. Cancellation is legal from
/// every state except `Cancelled` itself; cancelling a `Delivered` order
/// models a post-delivery return. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (
                    Self::Pending | Self::Processing | Self::Shipped | Self::Delivered,
                    Self::Cancelled
                )
        )
    }

    /// Whether the status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable snake_case text used in the database column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StatusParseError {
                kind: "order",
                value: s.to_string(),
            }),
        }
    }
}

/// Product availability status.
///
/// `Available` and `OutOfStock` are maintained automatically by the
/// inventory ledger as stock crosses zero. `Discontinued` is a terminal
/// manual state the ledger never assigns or clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    OutOfStock,
    Discontinued,
}

impl AvailabilityStatus {
    /// Whether the product can currently be sold.
    #[must_use]
    pub const fn is_sellable(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Stable snake_case text used in the database column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OutOfStock => "out_of_stock",
            Self::Discontinued => "discontinued",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "out_of_stock" => Ok(Self::OutOfStock),
            "discontinued" => Ok(Self::Discontinued),
            _ => Err(StatusParseError {
                kind: "availability",
                value: s.to_string(),
            }),
        }
    }
}
