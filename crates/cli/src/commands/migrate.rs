//! Database migration command.
//!
//! Migration files live in `crates/site/migrations/`. The site binary never
//! runs them automatically; deploys run this command first.

use super::{CommandError, connect};

/// Run site database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running site migrations...");
    sqlx::migrate!("../site/migrations").run(&pool).await?;

    tracing::info!("Site migrations complete!");
    Ok(())
}
