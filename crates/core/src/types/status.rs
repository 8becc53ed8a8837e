//! Order status enum.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted order.
///
/// Orders are created directly in `Completed` state by the webhook handler
/// (payment has already succeeded by the time a row exists). `Refunded` is
/// reserved for manual compensation of oversold stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Completed,
    Refunded,
}

impl OrderStatus {
    /// String form stored in the `orders.status` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a status column holds an unknown value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownOrderStatus(other.to_owned())),
        }
    }
}
