//! Order repository.
//!
//! Idempotency design: the `stripe_payment_intent_id` column is UNIQUE, and
//! order creation is an `INSERT ... ON CONFLICT DO NOTHING RETURNING id`. A
//! replayed webhook produces no returned row instead of a duplicate order, so
//! duplicate delivery is detected at the storage layer rather than by a
//! check-then-act read.

use sqlx::PgPool;
use uuid::Uuid;

use fiftymm_core::{OrderId, OrderStatus, PaymentIntentId};

use super::RepositoryError;
use crate::models::Order;

/// Fields of a new order row, as extracted from a verified webhook event.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub payment_intent_id: PaymentIntentId,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: Option<String>,
    /// Amount captured, in minor currency units.
    pub amount: i64,
}

/// Repository for order rows.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an order by its payment-intent id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_payment_intent(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, stripe_payment_intent_id, customer_email, customer_name,
                   shipping_address, amount, status, created_at
            FROM orders
            WHERE stripe_payment_intent_id = $1
            ",
        )
        .bind(payment_intent_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Insert an order unless one already exists for the same payment intent.
    ///
    /// Returns `Some(OrderId)` when this call created the row, `None` when the
    /// unique constraint on `stripe_payment_intent_id` suppressed the insert
    /// (i.e. the event is a replay).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails for any reason
    /// other than the idempotency conflict.
    pub async fn insert_if_absent(
        &self,
        order: &NewOrder,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r"
            INSERT INTO orders
                (id, stripe_payment_intent_id, customer_email, customer_name,
                 shipping_address, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stripe_payment_intent_id) DO NOTHING
            RETURNING id
            ",
        )
        .bind(OrderId::generate().as_uuid())
        .bind(order.payment_intent_id.as_str())
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(&order.shipping_address)
        .bind(order.amount)
        .bind(OrderStatus::Completed.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map(OrderId::new))
    }
}
