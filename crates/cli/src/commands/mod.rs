//! CLI subcommands.

pub mod migrate;
pub mod orders;
pub mod seed;

use secrecy::SecretString;

/// Order store URL from `CHECKOUT_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, migrate::MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var("CHECKOUT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| migrate::MigrationError::MissingEnvVar("CHECKOUT_DATABASE_URL"))
}
