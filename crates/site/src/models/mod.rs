//! Persisted rows for the shop.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A sellable product. This deployment carries exactly one, identified by
/// `SHOP_PRODUCT_ID`; `stock_quantity` is the only field fulfillment mutates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units (cents).
    pub price: i64,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether a checkout may start for this product.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// A captured order. `stripe_payment_intent_id` carries a UNIQUE constraint;
/// webhook replays surface as insert conflicts rather than duplicate rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub stripe_payment_intent_id: String,
    pub customer_email: String,
    pub customer_name: String,
    /// JSON-serialized shipping name + address, when Stripe collected one.
    pub shipping_address: Option<String>,
    /// Amount captured, in minor currency units.
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32) -> Product {
        Product {
            id: "zine-athens-rainforest".to_string(),
            name: "Athens Rainforest Zine".to_string(),
            description: None,
            price: 3500,
            stock_quantity: stock,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn in_stock_requires_positive_quantity() {
        assert!(product(1).in_stock());
        assert!(!product(0).in_stock());
        assert!(!product(-1).in_stock());
    }
}
