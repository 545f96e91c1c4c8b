//! Deadline decorator for collaborators.
//!
//! Every call to an external service goes through [`Bounded`], which turns
//! an overrun into [`CollaboratorError::Timeout`]. The inner future is
//! dropped on timeout; callers never see a late answer.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pineapple_checkout_core::{
    Address, AddressVerdict, Catalog, Channel, ChannelDirectory, ChannelSlug, CollaboratorError,
    GatewayResponse, Order, OrderId, OrderStore, PaymentGateway, PaymentRequest, ProductKind,
    ShippingMethod, ShippingRates, VariantId,
};
use tracing::warn;

/// Wraps a collaborator and bounds each call by `limit`.
pub struct Bounded<T> {
    inner: T,
    service: &'static str,
    limit: Duration,
}

impl<T> Bounded<T> {
    #[must_use]
    pub const fn new(inner: T, service: &'static str, limit: Duration) -> Self {
        Self {
            inner,
            service,
            limit,
        }
    }

    async fn run<R, F>(&self, call: F) -> Result<R, CollaboratorError>
    where
        F: Future<Output = Result<R, CollaboratorError>> + Send,
    {
        if let Ok(result) = tokio::time::timeout(self.limit, call).await {
            result
        } else {
            warn!(service = self.service, limit = ?self.limit, "Collaborator call timed out");
            Err(CollaboratorError::Timeout {
                service: self.service,
                after: self.limit,
            })
        }
    }
}

#[async_trait]
impl<T: Catalog> Catalog for Bounded<T> {
    async fn product_kinds(
        &self,
        variants: &[VariantId],
    ) -> Result<Vec<Option<ProductKind>>, CollaboratorError> {
        self.run(self.inner.product_kinds(variants)).await
    }
}

#[async_trait]
impl<T: ChannelDirectory> ChannelDirectory for Bounded<T> {
    async fn channel(&self, slug: &ChannelSlug) -> Result<Option<Channel>, CollaboratorError> {
        self.run(self.inner.channel(slug)).await
    }

    async fn validate_address(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<AddressVerdict, CollaboratorError> {
        self.run(self.inner.validate_address(channel, address)).await
    }
}

#[async_trait]
impl<T: ShippingRates> ShippingRates for Bounded<T> {
    async fn available_methods(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<Vec<ShippingMethod>, CollaboratorError> {
        self.run(self.inner.available_methods(channel, address)).await
    }
}

#[async_trait]
impl<T: PaymentGateway> PaymentGateway for Bounded<T> {
    async fn process(&self, request: &PaymentRequest) -> Result<GatewayResponse, CollaboratorError> {
        self.run(self.inner.process(request)).await
    }
}

#[async_trait]
impl<T: OrderStore> OrderStore for Bounded<T> {
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError> {
        self.run(self.inner.insert(order)).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError> {
        self.run(self.inner.get(id)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct SlowGateway(Duration);

    #[async_trait]
    impl PaymentGateway for SlowGateway {
        async fn process(
            &self,
            _request: &PaymentRequest,
        ) -> Result<GatewayResponse, CollaboratorError> {
            tokio::time::sleep(self.0).await;
            Ok(GatewayResponse::approved())
        }
    }

    struct SlowCatalog(Duration);

    #[async_trait]
    impl Catalog for SlowCatalog {
        async fn product_kinds(
            &self,
            variants: &[VariantId],
        ) -> Result<Vec<Option<ProductKind>>, CollaboratorError> {
            tokio::time::sleep(self.0).await;
            Ok(vec![Some(ProductKind::Digital); variants.len()])
        }
    }

    #[tokio::test]
    async fn test_overrun_becomes_timeout() {
        let catalog = Bounded::new(
            SlowCatalog(Duration::from_secs(30)),
            "catalog",
            Duration::from_millis(20),
        );
        let err = catalog
            .product_kinds(&[VariantId::new("ebook")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollaboratorError::Timeout { service: "catalog", after } if after == Duration::from_millis(20)
        ));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let catalog = Bounded::new(
            SlowCatalog(Duration::from_millis(1)),
            "catalog",
            Duration::from_secs(5),
        );
        let kinds = catalog
            .product_kinds(&[VariantId::new("ebook")])
            .await
            .unwrap();
        assert_eq!(kinds, vec![Some(ProductKind::Digital)]);
    }

    #[tokio::test]
    async fn test_slow_gateway_behind_trait_object() {
        let gateway: Box<dyn PaymentGateway> = Box::new(Bounded::new(
            SlowGateway(Duration::from_secs(30)),
            "payment gateway",
            Duration::from_millis(20),
        ));
        let request = serde_json::from_value::<PaymentRequest>(serde_json::json!({
            "checkout_id": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "checkout_token": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "channel": "default-channel",
            "currency": "USD",
            "email": "buyer@example.com",
            "lines": [],
            "billing_address": null,
            "shipping_address": null,
            "shipping_method": null
        }))
        .unwrap();
        let err = gateway.process(&request).await.unwrap_err();
        assert!(matches!(
            err,
            CollaboratorError::Timeout {
                service: "payment gateway",
                ..
            }
        ));
    }
}
