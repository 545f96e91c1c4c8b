//! Application state shared across handlers.

use std::sync::Arc;

use pineapple_checkout_core::{OrderStore, PaymentGateway};
use sqlx::PgPool;

use crate::config::CheckoutConfig;
use crate::db::{MemoryOrderStore, PgOrderStore};
use crate::seed::StoreSeed;
use crate::service::{CheckoutService, Collaborators};
use crate::services::{Bounded, CachedShippingRates, DummyGateway, HttpPaymentGateway, SeededStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the checkout service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    checkouts: CheckoutService,
}

impl AppState {
    /// Wire production collaborators from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Checkout configuration
    /// * `seed` - Channels, variants and shipping methods
    /// * `pool` - Order database; `None` keeps orders in memory
    #[must_use]
    pub fn new(config: CheckoutConfig, seed: StoreSeed, pool: Option<PgPool>) -> Self {
        let limit = config.collaborator_timeout;
        let store = SeededStore::new(seed);
        let (channels, variants, shipping_methods) = store.counts();
        tracing::info!(channels, variants, shipping_methods, "Seeded store ready");

        let payment_gateway: Arc<dyn PaymentGateway> =
            match &config.payment {
                Some(payment) => Arc::new(Bounded::new(
                    HttpPaymentGateway::new(payment),
                    "payment gateway",
                    limit,
                )),
                None => {
                    tracing::warn!("PAYMENT_GATEWAY_URL not set, using dummy payment gateway");
                    Arc::new(Bounded::new(
                        DummyGateway::approving(),
                        "payment gateway",
                        limit,
                    ))
                }
            };

        let orders: Arc<dyn OrderStore> = match pool {
            Some(pool) => Arc::new(Bounded::new(PgOrderStore::new(pool), "order store", limit)),
            None => {
                tracing::warn!("No database configured, orders are kept in memory");
                Arc::new(Bounded::new(MemoryOrderStore::new(), "order store", limit))
            }
        };

        let collaborators = Collaborators {
            catalog: Arc::new(Bounded::new(store.clone(), "catalog", limit)),
            channels: Arc::new(Bounded::new(store.clone(), "channel directory", limit)),
            shipping_rates: Arc::new(Bounded::new(
                CachedShippingRates::new(store, config.shipping_cache_ttl),
                "shipping rates",
                limit,
            )),
            payment_gateway,
            orders,
        };

        Self::with_service(config, CheckoutService::new(collaborators))
    }

    /// Build state around an existing service.
    #[must_use]
    pub fn with_service(config: CheckoutConfig, checkouts: CheckoutService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, checkouts }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutService {
        &self.inner.checkouts
    }
}
