//! Order persistence.
//!
//! # Database
//!
//! A single `orders` table. Each row keeps the full order snapshot as JSONB
//! next to a few indexed columns for operators.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p pineapple-checkout-cli -- migrate
//! ```
//!
//! Without a database URL the service keeps orders in a
//! [`MemoryOrderStore`], which loses them on restart.

mod memory;
mod orders;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use memory::MemoryOrderStore;
pub use orders::PgOrderStore;

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
