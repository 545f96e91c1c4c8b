//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! np-checkout migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string for the order
//!   store (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded at
//! compile time.

use pineapple_checkout::db::create_pool;

/// Errors running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run order store migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the database
/// cannot be reached, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to checkout database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running checkout migrations...");
    sqlx::migrate!("../checkout/migrations").run(&pool).await?;

    tracing::info!("Checkout migrations complete!");
    Ok(())
}
