//! The checkout aggregate.
//!
//! A [`Checkout`] is a single-writer draft of a purchase. Its fields are
//! private: line and address changes go through the methods here, while
//! shipping method and payment are written only by [`crate::gate`] and the
//! completed flag only by [`crate::completion`].
//!
//! # Invalidation
//!
//! - Line changes recompute `is_shipping_required` and drop the payment
//!   attempt.
//! - A new shipping address drops the shipping method and the payment
//!   attempt.
//! - A new shipping method drops the payment attempt.
//!
//! Every successful mutation bumps `version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{LineItem, is_shipping_required};
use crate::error::CheckoutError;
use crate::gate;
use crate::interfaces::{Channel, ShippingMethod};
use crate::payment::PaymentAttempt;
use crate::types::{
    Address, ChannelSlug, CheckoutId, CheckoutStage, CheckoutToken, CurrencyCode, Email, OrderId,
    VariantId,
};

/// An in-progress purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    id: CheckoutId,
    token: CheckoutToken,
    channel: ChannelSlug,
    currency: CurrencyCode,
    email: Email,
    lines: Vec<LineItem>,
    billing_address: Option<Address>,
    shipping_address: Option<Address>,
    is_shipping_required: bool,
    shipping_method: Option<ShippingMethod>,
    payment_attempt: Option<PaymentAttempt>,
    completed: bool,
    order_id: Option<OrderId>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Checkout {
    /// Start a checkout with classified lines.
    ///
    /// Lines for the same variant are merged by summing quantities.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if `lines` is empty.
    pub fn create(
        channel: &Channel,
        email: Email,
        lines: Vec<LineItem>,
    ) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut merged = Vec::with_capacity(lines.len());
        for line in lines {
            merge_add(&mut merged, line);
        }

        let now = Utc::now();
        Ok(Self {
            id: CheckoutId::generate(),
            token: CheckoutToken::generate(),
            channel: channel.slug.clone(),
            currency: channel.currency,
            email,
            is_shipping_required: is_shipping_required(&merged),
            lines: merged,
            billing_address: None,
            shipping_address: None,
            shipping_method: None,
            payment_attempt: None,
            completed: false,
            order_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn id(&self) -> CheckoutId {
        self.id
    }

    /// Customer-facing token.
    #[must_use]
    pub const fn token(&self) -> CheckoutToken {
        self.token
    }

    #[must_use]
    pub const fn channel(&self) -> &ChannelSlug {
        &self.channel
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub const fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    #[must_use]
    pub const fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    #[must_use]
    pub const fn is_shipping_required(&self) -> bool {
        self.is_shipping_required
    }

    #[must_use]
    pub const fn shipping_method(&self) -> Option<&ShippingMethod> {
        self.shipping_method.as_ref()
    }

    /// Result of the most recent payment attempt, if any.
    #[must_use]
    pub const fn payment_attempt(&self) -> Option<&PaymentAttempt> {
        self.payment_attempt.as_ref()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Order this checkout completed into.
    #[must_use]
    pub const fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Current workflow stage, derived from the fields.
    #[must_use]
    pub fn stage(&self) -> CheckoutStage {
        if self.completed {
            return CheckoutStage::Completed;
        }
        if self.lines.is_empty() {
            return CheckoutStage::Draft;
        }
        if self.is_shipping_required {
            if self.shipping_address.is_none() {
                return CheckoutStage::AddressPending;
            }
            if self.shipping_method.is_none() {
                return CheckoutStage::MethodPending;
            }
        }
        if gate::can_complete(self) {
            CheckoutStage::PaymentReady
        } else {
            CheckoutStage::PaymentPending
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Add lines, summing quantities for variants already present.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout.
    pub fn add_lines(&mut self, lines: Vec<LineItem>) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        for line in lines {
            merge_add(&mut self.lines, line);
        }
        self.lines_changed();
        Ok(())
    }

    /// Set quantities for the given variants.
    ///
    /// An existing line takes the new quantity, quantity `0` removes it, and
    /// unknown variants are appended. Nothing changes if the result would be
    /// empty or equals the current lines.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout,
    /// or [`CheckoutError::EmptyCart`] if every line would be removed.
    pub fn update_lines(&mut self, lines: Vec<LineItem>) -> Result<(), CheckoutError> {
        self.ensure_open()?;

        let mut updated = self.lines.clone();
        for line in lines {
            match position_of(&updated, &line.variant_id) {
                Some(index) if line.quantity == 0 => {
                    updated.remove(index);
                }
                Some(index) => {
                    if let Some(existing) = updated.get_mut(index) {
                        existing.quantity = line.quantity;
                    }
                }
                None if line.quantity == 0 => {}
                None => updated.push(line),
            }
        }

        if updated.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if updated == self.lines {
            return Ok(());
        }

        self.lines = updated;
        self.lines_changed();
        Ok(())
    }

    /// Replace the contact email.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout.
    pub fn set_email(&mut self, email: Email) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.email = email;
        self.touch();
        Ok(())
    }

    /// Set the billing address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout.
    pub fn set_billing_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.billing_address = Some(address);
        self.touch();
        Ok(())
    }

    /// Set the shipping address.
    ///
    /// The shipping method was chosen for the previous address, so it is
    /// cleared along with the payment attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout.
    pub fn set_shipping_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.shipping_address.as_ref() != Some(&address) {
            self.shipping_method = None;
            self.payment_attempt = None;
        }
        self.shipping_address = Some(address);
        self.touch();
        Ok(())
    }

    pub(crate) fn set_shipping_method(
        &mut self,
        method: ShippingMethod,
    ) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.shipping_method.as_ref() != Some(&method) {
            self.payment_attempt = None;
        }
        self.shipping_method = Some(method);
        self.touch();
        Ok(())
    }

    pub(crate) fn record_payment(&mut self, attempt: PaymentAttempt) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.payment_attempt = Some(attempt);
        self.touch();
        Ok(())
    }

    pub(crate) fn mark_completed(&mut self, order_id: OrderId) {
        self.completed = true;
        self.order_id = Some(order_id);
        self.touch();
    }

    /// Fail with [`CheckoutError::CheckoutCompleted`] once completed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutCompleted`] on a completed checkout.
    pub fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.completed {
            Err(CheckoutError::CheckoutCompleted)
        } else {
            Ok(())
        }
    }

    fn lines_changed(&mut self) {
        self.is_shipping_required = is_shipping_required(&self.lines);
        self.payment_attempt = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

fn position_of(lines: &[LineItem], variant: &VariantId) -> Option<usize> {
    lines.iter().position(|l| &l.variant_id == variant)
}

fn merge_add(lines: &mut Vec<LineItem>, line: LineItem) {
    match lines.iter_mut().find(|l| l.variant_id == line.variant_id) {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
        None => lines.push(line),
    }
}
