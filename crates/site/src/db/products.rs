//! Product repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Product;

/// Repository for product rows.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, stock_quantity, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Atomically take one unit of stock.
    ///
    /// The decrement is conditioned on `stock_quantity > 0` so the count can
    /// never go negative; under concurrent fulfillment of the last unit only
    /// one caller observes `true`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn decrement_stock(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock_quantity = stock_quantity - 1
            WHERE id = $1 AND stock_quantity > 0
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
