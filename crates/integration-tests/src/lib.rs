//! Integration tests for the Naked Pineapple checkout workflow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pineapple-checkout-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_workflow` - end-to-end scenarios through [`CheckoutService`]
//! - `concurrency` - competing operations, timeouts and lost store replies
//! - `http_api` - the axum router driven with `tower::ServiceExt::oneshot`
//!
//! Everything runs in memory: the store seed below stands in for the
//! catalog, channel and rate services, and [`ScriptedGateway`] and
//! [`FlakyOrderStore`] let tests decide how the payment gateway and order
//! store behave.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pineapple_checkout::config::CheckoutConfig;
use pineapple_checkout::db::MemoryOrderStore;
use pineapple_checkout::seed::StoreSeed;
use pineapple_checkout::services::{Bounded, SeededStore};
use pineapple_checkout::{AppState, CheckoutService, Collaborators};
use pineapple_checkout_core::{
    Address, ChannelSlug, CollaboratorError, GatewayResponse, LineInput, Order, OrderId,
    OrderStore, PaymentError, PaymentErrorCode, PaymentGateway, PaymentRequest,
};

/// Store seed shared by every test.
pub const SEED: &str = r#"
channels:
  - slug: default-channel
    currency: USD
    countries: [US, CA]
  - slug: channel-pln
    currency: PLN
    countries: [PL]

variants:
  - id: mug
    kind: PHYSICAL
  - id: poster
    kind: PHYSICAL
  - id: ebook
    kind: DIGITAL
  - id: song
    kind: DIGITAL
  - id: gift-card
    kind: DIGITAL

shipping_methods:
  - id: us-standard
    name: Standard
    channel: default-channel
    price: "5.00"
    countries: [US]
  - id: us-express
    name: Express
    channel: default-channel
    price: "15.00"
    countries: [US]
  - id: ca-standard
    name: Standard
    channel: default-channel
    price: "9.00"
    countries: [CA]
  - id: pl-courier
    name: Courier
    channel: channel-pln
    price: "14.99"
    countries: [PL]
"#;

#[must_use]
pub fn seed() -> StoreSeed {
    StoreSeed::from_yaml(SEED).unwrap()
}

#[must_use]
pub fn channel() -> ChannelSlug {
    ChannelSlug::new("default-channel")
}

pub const EMAIL: &str = "buyer@example.com";

#[must_use]
pub fn digital_lines() -> Vec<LineInput> {
    vec![LineInput::new("ebook", 1), LineInput::new("song", 2)]
}

#[must_use]
pub fn physical_lines() -> Vec<LineInput> {
    vec![LineInput::new("mug", 2), LineInput::new("ebook", 1)]
}

#[must_use]
pub fn address(country: &str) -> Address {
    Address {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        company_name: None,
        street_address_1: "1470 Pinewood Avenue".to_string(),
        street_address_2: None,
        city: "Michigan City".to_string(),
        city_area: None,
        postal_code: "49360".to_string(),
        country: country.to_string(),
        country_area: None,
        phone: None,
    }
}

#[must_use]
pub fn us_address() -> Address {
    address("US")
}

// =============================================================================
// Scripted payment gateway
// =============================================================================

/// How [`ScriptedGateway`] answers the next payment.
#[derive(Debug, Clone)]
pub enum GatewayMode {
    Approve,
    Decline(Vec<PaymentError>),
    /// Fail with [`CollaboratorError::Unavailable`].
    Unavailable,
    /// Sleep longer than any test timeout.
    Hang,
}

/// Payment gateway whose answer can be switched mid-test.
#[derive(Clone)]
pub struct ScriptedGateway {
    inner: Arc<ScriptedGatewayInner>,
}

struct ScriptedGatewayInner {
    mode: Mutex<GatewayMode>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            inner: Arc::new(ScriptedGatewayInner {
                mode: Mutex::new(mode),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_mode(&self, mode: GatewayMode) {
        *self.inner.mode.lock().unwrap() = mode;
    }

    /// Number of payments the gateway was asked to process.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[must_use]
pub fn declined(message: &str) -> GatewayMode {
    GatewayMode::Decline(vec![PaymentError {
        code: PaymentErrorCode::PaymentDeclined,
        field: None,
        message: message.to_string(),
    }])
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn process(&self, _request: &PaymentRequest) -> Result<GatewayResponse, CollaboratorError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let mode = self.inner.mode.lock().unwrap().clone();
        match mode {
            GatewayMode::Approve => Ok(GatewayResponse::approved()),
            GatewayMode::Decline(errors) => Ok(GatewayResponse::declined(errors)),
            GatewayMode::Unavailable => Err(CollaboratorError::Unavailable {
                service: "payment gateway",
                reason: "connection reset".to_string(),
            }),
            GatewayMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(GatewayResponse::approved())
            }
        }
    }
}

// =============================================================================
// Flaky order store
// =============================================================================

/// [`MemoryOrderStore`] that can drop replies, refuse or stall writes.
#[derive(Clone, Default)]
pub struct FlakyOrderStore {
    store: MemoryOrderStore,
    lost_replies: Arc<AtomicUsize>,
    refused_writes: Arc<AtomicUsize>,
    stalled_writes: Arc<AtomicUsize>,
}

impl FlakyOrderStore {
    /// The next `n` inserts are written but report a failure.
    pub fn lose_replies(&self, n: usize) {
        self.lost_replies.store(n, Ordering::SeqCst);
    }

    /// The next `n` inserts fail without writing.
    pub fn refuse_writes(&self, n: usize) {
        self.refused_writes.store(n, Ordering::SeqCst);
    }

    /// The next `n` inserts sleep before writing.
    pub fn stall_writes(&self, n: usize) {
        self.stalled_writes.store(n, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl OrderStore for FlakyOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError> {
        if take_one(&self.refused_writes) {
            return Err(CollaboratorError::Unavailable {
                service: "order store",
                reason: "write refused".to_string(),
            });
        }
        if take_one(&self.stalled_writes) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.store.insert(order).await?;
        if take_one(&self.lost_replies) {
            return Err(CollaboratorError::Unavailable {
                service: "order store",
                reason: "connection closed before reply".to_string(),
            });
        }
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError> {
        self.store.get(id).await
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A checkout service over the seeded store with controllable collaborators.
pub struct Harness {
    pub service: CheckoutService,
    pub gateway: ScriptedGateway,
    pub orders: FlakyOrderStore,
}

impl Harness {
    /// Approving gateway, one-second collaborator timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(GatewayMode::Approve, Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_gateway(mode: GatewayMode, limit: Duration) -> Self {
        let store = SeededStore::new(seed());
        let gateway = ScriptedGateway::new(mode);
        let orders = FlakyOrderStore::default();

        let service = CheckoutService::new(Collaborators {
            catalog: Arc::new(Bounded::new(store.clone(), "catalog", limit)),
            channels: Arc::new(Bounded::new(store.clone(), "channel directory", limit)),
            shipping_rates: Arc::new(Bounded::new(store, "shipping rates", limit)),
            payment_gateway: Arc::new(Bounded::new(gateway.clone(), "payment gateway", limit)),
            orders: Arc::new(Bounded::new(orders.clone(), "order store", limit)),
        });

        Self {
            service,
            gateway,
            orders,
        }
    }

    /// Application state for router tests, sharing this harness's service.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::with_service(CheckoutConfig::default(), self.service.clone())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
