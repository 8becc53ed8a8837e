//! Seed command for the shop product.
//!
//! The shop sells exactly one product; this upserts its row so a fresh
//! database (or a restock) is one command away.

use super::{CommandError, connect};

/// Create or update the product row.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the upsert fails.
pub async fn product(
    id: &str,
    name: &str,
    description: Option<&str>,
    price: i64,
    stock: i32,
) -> Result<(), CommandError> {
    let pool = connect().await?;

    sqlx::query(
        r"
        INSERT INTO products (id, name, description, price, stock_quantity)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            stock_quantity = EXCLUDED.stock_quantity
        ",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(stock)
    .execute(&pool)
    .await?;

    tracing::info!(id, price, stock, "Product seeded");
    Ok(())
}
