//! Database operations for the shop `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `products` - The single sellable product and its stock count
//! - `orders` - One row per captured payment, keyed by payment-intent id
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p fiftymm-cli -- migrate
//! ```
//!
//! Queries are runtime-bound (`sqlx::query` / `query_as`) rather than
//! compile-time macros so the workspace builds without a live database.

pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{NewOrder, OrderRepository};
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
