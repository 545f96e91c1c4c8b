//! Store seed: channels, sellable variants and shipping methods.
//!
//! The checkout service owns no catalog of its own. At startup it reads a
//! YAML seed describing what the store sells and where it ships, and serves
//! the catalog, channel and shipping-rate lookups from it.
//!
//! ```yaml
//! channels:
//!   - slug: default-channel
//!     currency: USD
//!     countries: [US, CA]
//! variants:
//!   - id: pineapple-mug
//!     kind: PHYSICAL
//!   - id: recipe-ebook
//!     kind: DIGITAL
//! shipping_methods:
//!   - id: standard
//!     name: Standard
//!     channel: default-channel
//!     price: "5.00"
//!     countries: [US]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pineapple_checkout_core::{ChannelSlug, CurrencyCode, ProductKind, ShippingMethodId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a store seed.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse seed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid seed: {0}")]
    Invalid(String),
}

/// A sales channel and the countries it delivers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSeed {
    pub slug: ChannelSlug,
    pub currency: CurrencyCode,
    /// ISO 3166-1 alpha-2 codes.
    pub countries: Vec<String>,
}

/// A sellable variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSeed {
    pub id: VariantId,
    pub kind: ProductKind,
}

/// A shipping method offered by one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethodSeed {
    pub id: ShippingMethodId,
    pub name: String,
    pub channel: ChannelSlug,
    /// Price in the channel currency.
    pub price: Decimal,
    pub countries: Vec<String>,
}

/// Parsed store seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub channels: Vec<ChannelSeed>,
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethodSeed>,
}

impl StoreSeed {
    /// Read and validate a seed file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate seed YAML.
    ///
    /// Country codes are upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the YAML is malformed or inconsistent.
    pub fn from_yaml(raw: &str) -> Result<Self, SeedError> {
        let mut seed: Self = serde_yaml::from_str(raw)?;
        seed.normalize();
        seed.validate()?;
        Ok(seed)
    }

    fn normalize(&mut self) {
        for channel in &mut self.channels {
            upper_case_all(&mut channel.countries);
        }
        for method in &mut self.shipping_methods {
            upper_case_all(&mut method.countries);
        }
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.channels.is_empty() {
            return Err(SeedError::Invalid("at least one channel is required".to_string()));
        }

        let mut slugs = HashSet::new();
        for channel in &self.channels {
            if !slugs.insert(&channel.slug) {
                return Err(SeedError::Invalid(format!(
                    "duplicate channel '{}'",
                    channel.slug
                )));
            }
        }

        let mut variants = HashSet::new();
        for variant in &self.variants {
            if !variants.insert(&variant.id) {
                return Err(SeedError::Invalid(format!(
                    "duplicate variant '{}'",
                    variant.id
                )));
            }
        }

        let mut methods = HashSet::new();
        for method in &self.shipping_methods {
            if !slugs.contains(&method.channel) {
                return Err(SeedError::Invalid(format!(
                    "shipping method '{}' references unknown channel '{}'",
                    method.id, method.channel
                )));
            }
            for country in &method.countries {
                if !methods.insert((&method.channel, &method.name, country)) {
                    return Err(SeedError::Invalid(format!(
                        "shipping method name '{}' offered twice to {country} in channel '{}'",
                        method.name, method.channel
                    )));
                }
            }
            if method.price.is_sign_negative() {
                return Err(SeedError::Invalid(format!(
                    "shipping method '{}' has a negative price",
                    method.id
                )));
            }
        }

        Ok(())
    }
}

fn upper_case_all(countries: &mut [String]) {
    for country in countries {
        *country = country.trim().to_ascii_uppercase();
    }
}
