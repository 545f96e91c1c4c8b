//! Postal addresses attached to a checkout.
//!
//! Only the structure is checked here. Whether a channel actually ships to
//! an address is decided by the address/channel service.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// A billing or shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub street_address_1: String,
    #[serde(default)]
    pub street_address_2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub city_area: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    #[serde(default)]
    pub country_area: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Address {
    /// Check required fields and normalize the country code to upper case.
    ///
    /// Returns every problem found, not just the first.
    ///
    /// # Errors
    ///
    /// Returns the list of field errors if any required field is blank or
    /// the country is not a two-letter code.
    pub fn normalized(mut self) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("street_address_1", &self.street_address_1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "this field is required"));
            }
        }

        let country = self.country.trim().to_ascii_uppercase();
        if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
            self.country = country;
        } else {
            errors.push(FieldError::new(
                "country",
                format!("'{}' is not an ISO 3166-1 alpha-2 code", self.country),
            ));
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}
