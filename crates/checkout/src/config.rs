//! Checkout service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3002)
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string for the order
//!   store (falls back to `DATABASE_URL`; orders stay in memory when unset)
//! - `CHECKOUT_SEED_PATH` - Store seed YAML (default: crates/checkout/seed.yaml)
//! - `CHECKOUT_COLLABORATOR_TIMEOUT_MS` - Per-call limit for external services (default: 5000)
//! - `CHECKOUT_SHIPPING_CACHE_TTL_SECS` - Shipping quote cache TTL (default: 300)
//! - `PAYMENT_GATEWAY_URL` - Payment gateway endpoint (dummy gateway when unset)
//! - `PAYMENT_GATEWAY_API_KEY` - Required when `PAYMENT_GATEWAY_URL` is set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout service configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` URL for the order store (contains password)
    pub database_url: Option<SecretString>,
    /// Store seed describing channels, variants and shipping methods
    pub seed_path: PathBuf,
    /// Upper bound for every collaborator call
    pub collaborator_timeout: Duration,
    /// How long shipping quotes stay cached
    pub shipping_cache_ttl: Duration,
    /// Remote payment gateway; `None` selects the dummy gateway
    pub payment: Option<PaymentGatewayConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Remote payment gateway configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PaymentGatewayConfig {
    /// Endpoint receiving payment requests
    pub url: Url,
    /// Bearer key for the gateway
    pub api_key: SecretString,
}

impl std::fmt::Debug for PaymentGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGatewayConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3002,
            database_url: None,
            seed_path: PathBuf::from("crates/checkout/seed.yaml"),
            collaborator_timeout: Duration::from_millis(5000),
            shipping_cache_ttl: Duration::from_secs(300),
            payment: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if the payment
    /// gateway is half-configured or its key fails secret validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let host = parse_env_or("CHECKOUT_HOST", defaults.host)?;
        let port = parse_env_or("CHECKOUT_PORT", defaults.port)?;
        let database_url = get_database_url("CHECKOUT_DATABASE_URL");
        let seed_path = get_optional_env("CHECKOUT_SEED_PATH")
            .map_or(defaults.seed_path, PathBuf::from);
        let timeout_ms: u64 = parse_env_or("CHECKOUT_COLLABORATOR_TIMEOUT_MS", 5000)?;
        let cache_ttl_secs: u64 = parse_env_or("CHECKOUT_SHIPPING_CACHE_TTL_SECS", 300)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_COLLABORATOR_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let payment = PaymentGatewayConfig::from_env()?;

        Ok(Self {
            host,
            port,
            database_url,
            seed_path,
            collaborator_timeout: Duration::from_millis(timeout_ms),
            shipping_cache_ttl: Duration::from_secs(cache_ttl_secs),
            payment,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentGatewayConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(url) = get_optional_env("PAYMENT_GATEWAY_URL") else {
            return Ok(None);
        };
        let url = Url::parse(&url).map_err(|e| {
            ConfigError::InvalidEnvVar("PAYMENT_GATEWAY_URL".to_string(), e.to_string())
        })?;
        let api_key = get_validated_secret("PAYMENT_GATEWAY_API_KEY")?;
        Ok(Some(Self { url, api_key }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
