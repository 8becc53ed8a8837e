//! Integration tests for the Fiftymillimeter site.
//!
//! Tests live in `tests/` and run against a real server and database, so
//! they are `#[ignore]`d by default:
//!
//! ```bash
//! cargo run -p fiftymm-cli -- migrate
//! cargo run -p fiftymm-site &
//! cargo test -p fiftymm-integration-tests -- --ignored
//! ```
//!
//! Configuration comes from the environment:
//! - `SITE_BASE_URL` (default `http://localhost:3000`)
//! - `SITE_DATABASE_URL` or `DATABASE_URL` for direct state assertions
//! - `STRIPE_WEBHOOK_SECRET`, matching the running server's secret
