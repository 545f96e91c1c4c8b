//! Checkout service: the workflow operations behind the HTTP API.
//!
//! # Concurrency
//!
//! Checkouts live in a registry of `Arc<Mutex<Slot>>` keyed by token.
//! Each operation holds its checkout's mutex from start to finish, so two
//! operations on the same checkout never interleave while different
//! checkouts proceed in parallel.
//!
//! Mutations run against a clone of the aggregate and write it back only
//! after every collaborator call succeeded. If the future is dropped or a
//! collaborator fails, the stored checkout is unchanged.
//!
//! # Unobserved completions
//!
//! A completion that timed out, lost its reply or was dropped may still
//! have stored the order. The slot remembers that until the order store
//! gives a definite answer. Every later mutation first looks the order up:
//! if it exists the checkout is completed by it and the mutation fails with
//! `CheckoutCompleted`, so a stored order always matches its checkout.

use std::collections::HashMap;
use std::sync::Arc;

use pineapple_checkout_core::classifier::resolve_lines;
use pineapple_checkout_core::{
    Address, AddressVerdict, Catalog, ChannelDirectory, ChannelSlug, Checkout, CheckoutError,
    CheckoutToken, Email, ErrorKind, LineInput, Order, OrderId, OrderStore, PaymentAttempt,
    PaymentGateway, QuantityRule, Readiness, ShippingMethod, ShippingRates, completion, gate,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

type Result<T> = std::result::Result<T, CheckoutError>;

/// The external services a [`CheckoutService`] calls.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub channels: Arc<dyn ChannelDirectory>,
    pub shipping_rates: Arc<dyn ShippingRates>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub orders: Arc<dyn OrderStore>,
}

/// Checkout workflow over a registry of live checkouts.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct CheckoutService {
    inner: Arc<CheckoutServiceInner>,
}

struct CheckoutServiceInner {
    collaborators: Collaborators,
    checkouts: RwLock<HashMap<CheckoutToken, Arc<Mutex<Slot>>>>,
}

struct Slot {
    checkout: Checkout,
    /// A completion ran without the store confirming or refusing the order.
    completion_in_doubt: bool,
}

impl Slot {
    const fn new(checkout: Checkout) -> Self {
        Self {
            checkout,
            completion_in_doubt: false,
        }
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            inner: Arc::new(CheckoutServiceInner {
                collaborators,
                checkouts: RwLock::new(HashMap::new()),
            }),
        }
    }

    fn collaborators(&self) -> &Collaborators {
        &self.inner.collaborators
    }

    async fn handle(&self, token: CheckoutToken) -> Result<Arc<Mutex<Slot>>> {
        self.inner
            .checkouts
            .read()
            .await
            .get(&token)
            .cloned()
            .ok_or(CheckoutError::CheckoutNotFound(token))
    }

    /// Resolve an unobserved completion before the checkout changes.
    async fn settle(&self, slot: &mut Slot) -> Result<()> {
        if !slot.completion_in_doubt {
            return Ok(());
        }

        let id = OrderId::for_checkout(slot.checkout.id());
        let stored = self
            .collaborators()
            .orders
            .get(id)
            .await
            .map_err(CheckoutError::from)
            .inspect_err(log_failure)?;
        if let Some(order) = stored {
            let mut draft = slot.checkout.clone();
            completion::adopt(&mut draft, &order).inspect_err(log_failure)?;
            slot.checkout = draft;
        }
        slot.completion_in_doubt = false;
        Ok(())
    }

    // =========================================================================
    // Checkout lifecycle
    // =========================================================================

    /// Start a checkout in `channel` for `email` with the given lines.
    ///
    /// # Errors
    ///
    /// - `InvalidChannel` if the channel is unknown
    /// - `InvalidEmail`, `InvalidQuantity`, `EmptyCart` for bad input
    /// - `VariantNotFound` if the catalog does not know a variant
    /// - `Collaborator` if the catalog or channel service fails
    #[instrument(skip(self, email, lines), fields(lines = lines.len()))]
    pub async fn create(
        &self,
        channel: &ChannelSlug,
        email: &str,
        lines: &[LineInput],
    ) -> Result<Checkout> {
        let email = Email::parse(email)?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let channel = self
            .collaborators()
            .channels
            .channel(channel)
            .await
            .map_err(CheckoutError::from)
            .inspect_err(log_failure)?
            .ok_or_else(|| CheckoutError::InvalidChannel(channel.clone()))?;
        let items = resolve_lines(
            self.collaborators().catalog.as_ref(),
            lines,
            QuantityRule::Positive,
        )
        .await
        .inspect_err(log_failure)?;

        let checkout = Checkout::create(&channel, email, items)?;
        self.inner
            .checkouts
            .write()
            .await
            .insert(checkout.token(), Arc::new(Mutex::new(Slot::new(checkout.clone()))));

        info!(
            token = %checkout.token(),
            channel = %checkout.channel(),
            is_shipping_required = checkout.is_shipping_required(),
            "Checkout created"
        );
        Ok(checkout)
    }

    /// Current state of a checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutNotFound` for an unknown token.
    pub async fn get(&self, token: CheckoutToken) -> Result<Checkout> {
        let handle = self.handle(token).await?;
        let slot = handle.lock().await;
        Ok(slot.checkout.clone())
    }

    // =========================================================================
    // Lines and contact details
    // =========================================================================

    /// Add lines, summing quantities for variants already present.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`, `CheckoutCompleted`
    /// - `InvalidQuantity`, `VariantNotFound`, `EmptyCart` for bad input
    /// - `Collaborator` if the catalog fails
    #[instrument(skip(self, lines), fields(token = %token))]
    pub async fn add_lines(&self, token: CheckoutToken, lines: &[LineInput]) -> Result<Checkout> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;
        slot.checkout.ensure_open()?;

        let items = resolve_lines(
            self.collaborators().catalog.as_ref(),
            lines,
            QuantityRule::Positive,
        )
        .await
        .inspect_err(log_failure)?;
        let mut draft = slot.checkout.clone();
        draft.add_lines(items)?;

        slot.checkout = draft;
        info!(
            lines = slot.checkout.lines().len(),
            is_shipping_required = slot.checkout.is_shipping_required(),
            "Lines added"
        );
        Ok(slot.checkout.clone())
    }

    /// Set line quantities; quantity `0` removes a line.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`, `CheckoutCompleted`
    /// - `InvalidQuantity`, `VariantNotFound`, `EmptyCart` for bad input
    /// - `Collaborator` if the catalog fails
    #[instrument(skip(self, lines), fields(token = %token))]
    pub async fn update_lines(
        &self,
        token: CheckoutToken,
        lines: &[LineInput],
    ) -> Result<Checkout> {
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;
        slot.checkout.ensure_open()?;

        let items = resolve_lines(
            self.collaborators().catalog.as_ref(),
            lines,
            QuantityRule::AllowZero,
        )
        .await
        .inspect_err(log_failure)?;
        let mut draft = slot.checkout.clone();
        draft.update_lines(items)?;

        slot.checkout = draft;
        info!(
            lines = slot.checkout.lines().len(),
            is_shipping_required = slot.checkout.is_shipping_required(),
            "Lines updated"
        );
        Ok(slot.checkout.clone())
    }

    /// Replace the contact email.
    ///
    /// # Errors
    ///
    /// `CheckoutNotFound`, `CheckoutCompleted`, `InvalidEmail`.
    #[instrument(skip(self, email), fields(token = %token))]
    pub async fn set_email(&self, token: CheckoutToken, email: &str) -> Result<Checkout> {
        let email = Email::parse(email)?;
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;
        slot.checkout.set_email(email)?;
        Ok(slot.checkout.clone())
    }

    /// Set the billing address. Only the address structure is checked.
    ///
    /// # Errors
    ///
    /// `CheckoutNotFound`, `CheckoutCompleted`, `AddressRejected`.
    #[instrument(skip(self, address), fields(token = %token))]
    pub async fn set_billing_address(
        &self,
        token: CheckoutToken,
        address: Address,
    ) -> Result<Checkout> {
        let address = address.normalized().map_err(CheckoutError::AddressRejected)?;
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;
        slot.checkout.set_billing_address(address)?;
        info!("Billing address set");
        Ok(slot.checkout.clone())
    }

    /// Set the shipping address after the channel accepted it.
    ///
    /// A different address clears the shipping method and payment attempt.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`, `CheckoutCompleted`
    /// - `AddressRejected` if the address is malformed or not served
    /// - `Collaborator` if the channel service fails
    #[instrument(skip(self, address), fields(token = %token))]
    pub async fn set_shipping_address(
        &self,
        token: CheckoutToken,
        address: Address,
    ) -> Result<Checkout> {
        let address = address.normalized().map_err(CheckoutError::AddressRejected)?;
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;
        slot.checkout.ensure_open()?;

        let verdict = self
            .collaborators()
            .channels
            .validate_address(slot.checkout.channel(), &address)
            .await
            .map_err(CheckoutError::from)
            .inspect_err(log_failure)?;
        if let AddressVerdict::Rejected(errors) = verdict {
            warn!(country = %address.country, "Shipping address rejected by channel");
            return Err(CheckoutError::AddressRejected(errors));
        }

        let mut draft = slot.checkout.clone();
        draft.set_shipping_address(address)?;

        slot.checkout = draft;
        info!(
            country = ?slot.checkout.shipping_address().map(|a| &a.country),
            "Shipping address set"
        );
        Ok(slot.checkout.clone())
    }

    // =========================================================================
    // Shipping and payment
    // =========================================================================

    /// Methods offered for the checkout's shipping address.
    ///
    /// # Errors
    ///
    /// `CheckoutNotFound`, or `Collaborator` if the rate service fails.
    #[instrument(skip(self), fields(token = %token))]
    pub async fn available_shipping_methods(
        &self,
        token: CheckoutToken,
    ) -> Result<Vec<ShippingMethod>> {
        let handle = self.handle(token).await?;
        let slot = handle.lock().await;
        gate::available_shipping_methods(&slot.checkout, self.collaborators().shipping_rates.as_ref())
            .await
            .inspect_err(log_failure)
    }

    /// Choose a shipping method by name.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`, `CheckoutCompleted`
    /// - `ShippingMethodNotFound` without an address or for an unknown name
    /// - `Collaborator` if the rate service fails
    #[instrument(skip(self), fields(token = %token))]
    pub async fn resolve_shipping_method(
        &self,
        token: CheckoutToken,
        method_name: &str,
    ) -> Result<Checkout> {
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;

        let mut draft = slot.checkout.clone();
        gate::resolve_shipping_method(
            &mut draft,
            method_name,
            self.collaborators().shipping_rates.as_ref(),
        )
        .await
        .inspect_err(log_failure)?;

        slot.checkout = draft;
        Ok(slot.checkout.clone())
    }

    /// Attempt payment for the checkout.
    ///
    /// Declines are not errors: they come back as an attempt with errors.
    ///
    /// # Errors
    ///
    /// `CheckoutNotFound`, `CheckoutCompleted`, or `Collaborator` if the
    /// gateway gave no answer.
    #[instrument(skip(self), fields(token = %token))]
    pub async fn attempt_payment(&self, token: CheckoutToken) -> Result<PaymentAttempt> {
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        self.settle(&mut slot).await?;

        let mut draft = slot.checkout.clone();
        let attempt =
            gate::attempt_payment(&mut draft, self.collaborators().payment_gateway.as_ref())
                .await
                .inspect_err(log_failure)?;

        slot.checkout = draft;
        if !attempt.success() {
            warn!(errors = attempt.errors.len(), "Payment attempt failed");
        }
        Ok(attempt)
    }

    /// Readiness summary.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutNotFound` for an unknown token.
    pub async fn readiness(&self, token: CheckoutToken) -> Result<Readiness> {
        let handle = self.handle(token).await?;
        let slot = handle.lock().await;
        Ok(gate::readiness(&slot.checkout))
    }

    // =========================================================================
    // Completion and orders
    // =========================================================================

    /// Turn a ready checkout into an order.
    ///
    /// Retrying after a failed call is safe: an order the failed call stored
    /// is returned instead of a second one.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`
    /// - `CheckoutCompleted` if an earlier call already completed it
    /// - `CheckoutNotReady` listing every unmet precondition
    /// - `Collaborator` if the order store fails
    #[instrument(skip(self), fields(token = %token))]
    pub async fn complete(&self, token: CheckoutToken) -> Result<Order> {
        let handle = self.handle(token).await?;
        let mut slot = handle.lock().await;
        slot.completion_in_doubt = true;

        let mut draft = slot.checkout.clone();
        match completion::complete(&mut draft, self.collaborators().orders.as_ref()).await {
            Ok(order) => {
                slot.checkout = draft;
                slot.completion_in_doubt = false;
                Ok(order)
            }
            Err(err) => {
                // Only a collaborator failure leaves the outcome unknown
                if err.kind() != ErrorKind::Transient {
                    slot.completion_in_doubt = false;
                }
                log_failure(&err);
                Err(err)
            }
        }
    }

    /// Load an order.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, or `Collaborator` if the order store fails.
    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<Order> {
        self.collaborators()
            .orders
            .get(id)
            .await
            .map_err(CheckoutError::from)
            .inspect_err(log_failure)?
            .ok_or(CheckoutError::OrderNotFound(id))
    }

    /// The order a checkout completed into.
    ///
    /// Settles an unobserved completion first, so an order stored by a call
    /// that never returned is found.
    ///
    /// # Errors
    ///
    /// - `CheckoutNotFound`
    /// - `OrderNotFound` if the checkout has not completed
    /// - `Collaborator` if the order store fails
    #[instrument(skip(self), fields(token = %token))]
    pub async fn order_for_checkout(&self, token: CheckoutToken) -> Result<Order> {
        let handle = self.handle(token).await?;
        let id = {
            let mut slot = handle.lock().await;
            self.settle(&mut slot).await?;
            let checkout = &slot.checkout;
            checkout
                .order_id()
                .ok_or_else(|| CheckoutError::OrderNotFound(OrderId::for_checkout(checkout.id())))?
        };
        self.order(id).await
    }
}

fn log_failure(err: &CheckoutError) {
    if err.kind() == ErrorKind::Transient {
        error!(error = %err, "Collaborator failure");
    }
}
