//! Shipping quote cache.
//!
//! Quotes are keyed by `(channel, address)`. A changed address is a new key,
//! so a cached answer is never served for an address it was not computed
//! for. Errors are not cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use pineapple_checkout_core::{
    Address, ChannelSlug, CollaboratorError, ShippingMethod, ShippingRates,
};
use tracing::debug;

type QuoteKey = (ChannelSlug, Address);

/// Caching decorator over a [`ShippingRates`] implementation.
pub struct CachedShippingRates<R> {
    inner: R,
    cache: Cache<QuoteKey, Arc<Vec<ShippingMethod>>>,
}

impl<R: ShippingRates> CachedShippingRates<R> {
    /// Cache quotes from `inner` for `ttl`.
    #[must_use]
    pub fn new(inner: R, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }
}

#[async_trait]
impl<R: ShippingRates> ShippingRates for CachedShippingRates<R> {
    async fn available_methods(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<Vec<ShippingMethod>, CollaboratorError> {
        let key = (channel.clone(), address.clone());
        if let Some(methods) = self.cache.get(&key).await {
            debug!(channel = %channel, country = %address.country, "Cache hit for shipping quote");
            return Ok(methods.as_ref().clone());
        }

        let methods = self.inner.available_methods(channel, address).await?;
        self.cache.insert(key, Arc::new(methods.clone())).await;
        Ok(methods)
    }
}
