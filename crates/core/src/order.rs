//! Orders produced by checkout completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::Checkout;
use crate::classifier::LineItem;
use crate::interfaces::ShippingMethod;
use crate::payment::PaymentAttempt;
use crate::types::{
    Address, ChannelSlug, CheckoutId, CheckoutToken, CurrencyCode, Email, OrderId, OrderStatus,
};

/// Immutable snapshot of a completed checkout.
///
/// Every field is copied from the checkout at the instant of completion;
/// `is_shipping_required` in particular is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    checkout_id: CheckoutId,
    checkout_token: CheckoutToken,
    status: OrderStatus,
    channel: ChannelSlug,
    currency: CurrencyCode,
    email: Email,
    is_shipping_required: bool,
    lines: Vec<LineItem>,
    billing_address: Option<Address>,
    shipping_address: Option<Address>,
    shipping_method: Option<ShippingMethod>,
    payment: Option<PaymentAttempt>,
    created_at: DateTime<Utc>,
}

impl Order {
    pub(crate) fn snapshot(checkout: &Checkout, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::for_checkout(checkout.id()),
            checkout_id: checkout.id(),
            checkout_token: checkout.token(),
            status: OrderStatus::Unfulfilled,
            channel: checkout.channel().clone(),
            currency: checkout.currency(),
            email: checkout.email().clone(),
            is_shipping_required: checkout.is_shipping_required(),
            lines: checkout.lines().to_vec(),
            billing_address: checkout.billing_address().cloned(),
            shipping_address: checkout.shipping_address().cloned(),
            shipping_method: checkout.shipping_method().cloned(),
            payment: checkout.payment_attempt().cloned(),
            created_at,
        }
    }

    /// Whether this order is what completing `checkout` now would produce,
    /// ignoring when it was created.
    #[must_use]
    pub fn is_snapshot_of(&self, checkout: &Checkout) -> bool {
        *self == Self::snapshot(checkout, self.created_at)
    }

    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    #[must_use]
    pub const fn checkout_id(&self) -> CheckoutId {
        self.checkout_id
    }

    #[must_use]
    pub const fn checkout_token(&self) -> CheckoutToken {
        self.checkout_token
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
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
    pub const fn is_shipping_required(&self) -> bool {
        self.is_shipping_required
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
    pub const fn shipping_method(&self) -> Option<&ShippingMethod> {
        self.shipping_method.as_ref()
    }

    /// The payment attempt that allowed completion.
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentAttempt> {
        self.payment.as_ref()
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
