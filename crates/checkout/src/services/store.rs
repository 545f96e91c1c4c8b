//! Catalog, channel and shipping-rate lookups served from the store seed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pineapple_checkout_core::{
    Address, AddressVerdict, Catalog, Channel, ChannelDirectory, ChannelSlug, CollaboratorError,
    FieldError, Money, ProductKind, ShippingMethod, ShippingRates, VariantId,
};

use crate::seed::{ChannelSeed, ShippingMethodSeed, StoreSeed};

/// In-process store directory built from a [`StoreSeed`].
///
/// Cheap to clone; every clone shares the same tables.
#[derive(Clone)]
pub struct SeededStore {
    inner: Arc<SeededStoreInner>,
}

struct SeededStoreInner {
    channels: HashMap<ChannelSlug, ChannelSeed>,
    variants: HashMap<VariantId, ProductKind>,
    shipping_methods: Vec<ShippingMethodSeed>,
}

impl SeededStore {
    #[must_use]
    pub fn new(seed: StoreSeed) -> Self {
        Self {
            inner: Arc::new(SeededStoreInner {
                channels: seed
                    .channels
                    .into_iter()
                    .map(|c| (c.slug.clone(), c))
                    .collect(),
                variants: seed.variants.into_iter().map(|v| (v.id, v.kind)).collect(),
                shipping_methods: seed.shipping_methods,
            }),
        }
    }

    /// Number of channels, variants and shipping methods loaded.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.inner.channels.len(),
            self.inner.variants.len(),
            self.inner.shipping_methods.len(),
        )
    }
}

#[async_trait]
impl Catalog for SeededStore {
    async fn product_kinds(
        &self,
        variants: &[VariantId],
    ) -> Result<Vec<Option<ProductKind>>, CollaboratorError> {
        Ok(variants
            .iter()
            .map(|id| self.inner.variants.get(id).copied())
            .collect())
    }
}

#[async_trait]
impl ChannelDirectory for SeededStore {
    async fn channel(&self, slug: &ChannelSlug) -> Result<Option<Channel>, CollaboratorError> {
        Ok(self.inner.channels.get(slug).map(|c| Channel {
            slug: c.slug.clone(),
            currency: c.currency,
        }))
    }

    async fn validate_address(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<AddressVerdict, CollaboratorError> {
        let Some(seed) = self.inner.channels.get(channel) else {
            return Ok(AddressVerdict::Rejected(vec![FieldError::general(format!(
                "channel '{channel}' does not exist"
            ))]));
        };
        if seed.countries.iter().any(|c| c == &address.country) {
            Ok(AddressVerdict::Accepted)
        } else {
            Ok(AddressVerdict::Rejected(vec![FieldError::new(
                "country",
                format!("channel '{channel}' does not deliver to {}", address.country),
            )]))
        }
    }
}

#[async_trait]
impl ShippingRates for SeededStore {
    async fn available_methods(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<Vec<ShippingMethod>, CollaboratorError> {
        let Some(seed) = self.inner.channels.get(channel) else {
            return Ok(Vec::new());
        };
        Ok(self
            .inner
            .shipping_methods
            .iter()
            .filter(|m| &m.channel == channel && m.countries.contains(&address.country))
            .map(|m| ShippingMethod {
                id: m.id.clone(),
                name: m.name.clone(),
                price: Money::new(m.price, seed.currency),
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pineapple_checkout_core::CurrencyCode;
    use rust_decimal::Decimal;

    use super::*;

    fn store() -> SeededStore {
        SeededStore::new(
            StoreSeed::from_yaml(
                r#"
channels:
  - slug: eu
    currency: EUR
    countries: [PL, DE]
variants:
  - id: mug
    kind: PHYSICAL
  - id: ebook
    kind: DIGITAL
shipping_methods:
  - id: courier
    name: Courier
    channel: eu
    price: "12.50"
    countries: [PL]
  - id: post
    name: Post
    channel: eu
    price: "4.00"
    countries: [PL, DE]
"#,
            )
            .unwrap(),
        )
    }

    fn address(country: &str) -> Address {
        Address {
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            company_name: None,
            street_address_1: "ul. Ananasowa 4".to_string(),
            street_address_2: None,
            city: "Krakow".to_string(),
            city_area: None,
            postal_code: "30-001".to_string(),
            country: country.to_string(),
            country_area: None,
            phone: None,
        }
    }

    #[test]
    fn test_counts() {
        assert_eq!(store().counts(), (1, 2, 2));
    }

    #[tokio::test]
    async fn test_product_kinds_in_input_order() {
        let kinds = store()
            .product_kinds(&[
                VariantId::new("ebook"),
                VariantId::new("ghost"),
                VariantId::new("mug"),
            ])
            .await
            .unwrap();
        assert_eq!(kinds, vec![
            Some(ProductKind::Digital),
            None,
            Some(ProductKind::Physical)
        ]);
    }

    #[tokio::test]
    async fn test_methods_filtered_by_country_and_priced_in_channel_currency() {
        let store = store();
        let eu = ChannelSlug::new("eu");

        let pl = store.available_methods(&eu, &address("PL")).await.unwrap();
        assert_eq!(pl.len(), 2);
        assert_eq!(
            pl[0].price,
            Money::new(Decimal::new(1250, 2), CurrencyCode::EUR)
        );

        let de = store.available_methods(&eu, &address("DE")).await.unwrap();
        assert_eq!(de.len(), 1);
        assert_eq!(de[0].name, "Post");

        assert!(
            store
                .available_methods(&ChannelSlug::new("us"), &address("PL"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_address_outside_channel_rejected() {
        let store = store();
        let eu = ChannelSlug::new("eu");
        assert_eq!(
            store.validate_address(&eu, &address("DE")).await.unwrap(),
            AddressVerdict::Accepted
        );
        match store.validate_address(&eu, &address("US")).await.unwrap() {
            AddressVerdict::Rejected(errors) => {
                assert_eq!(errors[0].field.as_deref(), Some("country"));
            }
            AddressVerdict::Accepted => panic!("US should not be served"),
        }
    }
}
