//! Monetary amounts in minor currency units.
//!
//! Stripe amounts and the `products.price` / `orders.amount` columns are all
//! integer minor units (cents for USD), so the site never does decimal
//! arithmetic on money.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (e.g. cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Wrap a raw minor-unit amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the raw minor-unit amount.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Format as a dollar amount (`"35.00"` for 3500 cents).
    ///
    /// Used by the order-confirmation email template.
    #[must_use]
    pub fn display_major(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MinorUnits {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<MinorUnits> for i64 {
    fn from(amount: MinorUnits) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_whole_dollars() {
        assert_eq!(MinorUnits::new(3500).display_major(), "35.00");
    }

    #[test]
    fn displays_sub_dollar_amounts() {
        assert_eq!(MinorUnits::new(5).display_major(), "0.05");
        assert_eq!(MinorUnits::new(99).display_major(), "0.99");
    }

    #[test]
    fn displays_mixed_amounts() {
        assert_eq!(MinorUnits::new(1234).display_major(), "12.34");
    }

    #[test]
    fn displays_negative_amounts() {
        assert_eq!(MinorUnits::new(-150).display_major(), "-1.50");
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&MinorUnits::new(3500)).expect("serialize");
        assert_eq!(json, "3500");
    }
}
