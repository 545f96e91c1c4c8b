//! Payment attempts and the snapshot handed to the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::Checkout;
use crate::classifier::LineItem;
use crate::interfaces::ShippingMethod;
use crate::types::{Address, ChannelSlug, CheckoutId, CheckoutToken, CurrencyCode, Email};

/// Error codes carried by a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentErrorCode {
    /// Physical goods need a shipping method before payment.
    ShippingMethodRequired,
    /// The gateway declined the payment.
    PaymentDeclined,
    /// The gateway rejected the request as malformed.
    Invalid,
    /// The gateway failed without a more specific code.
    GatewayError,
}

/// One reason a payment attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

impl PaymentError {
    /// The error produced when shipping is required but no method is set.
    #[must_use]
    pub fn shipping_method_required() -> Self {
        Self {
            code: PaymentErrorCode::ShippingMethodRequired,
            field: Some("shipping_method".to_string()),
            message: "Shipping method is not set".to_string(),
        }
    }
}

/// Outcome of the most recent payment attempt on a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub errors: Vec<PaymentError>,
    pub attempted_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub(crate) fn new(errors: Vec<PaymentError>) -> Self {
        Self {
            errors,
            attempted_at: Utc::now(),
        }
    }

    /// `true` iff the attempt produced no errors.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What the gateway answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<PaymentError>,
}

impl GatewayResponse {
    /// An approval.
    #[must_use]
    pub const fn approved() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// A decline with the given errors.
    #[must_use]
    pub const fn declined(errors: Vec<PaymentError>) -> Self {
        Self {
            success: false,
            errors,
        }
    }

    /// Gateway errors, forwarded as-is.
    ///
    /// A failure reported without any error gets one `GATEWAY_ERROR` so that
    /// success always equals an empty error list.
    pub(crate) fn into_errors(self) -> Vec<PaymentError> {
        if !self.success && self.errors.is_empty() {
            return vec![PaymentError {
                code: PaymentErrorCode::GatewayError,
                field: None,
                message: "Payment gateway reported a failure without details".to_string(),
            }];
        }
        self.errors
    }
}

/// Checkout snapshot sent to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub checkout_id: CheckoutId,
    pub checkout_token: CheckoutToken,
    pub channel: ChannelSlug,
    pub currency: CurrencyCode,
    pub email: Email,
    pub lines: Vec<LineItem>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<ShippingMethod>,
}

impl From<&Checkout> for PaymentRequest {
    fn from(checkout: &Checkout) -> Self {
        Self {
            checkout_id: checkout.id(),
            checkout_token: checkout.token(),
            channel: checkout.channel().clone(),
            currency: checkout.currency(),
            email: checkout.email().clone(),
            lines: checkout.lines().to_vec(),
            billing_address: checkout.billing_address().cloned(),
            shipping_address: checkout.shipping_address().cloned(),
            shipping_method: checkout.shipping_method().cloned(),
        }
    }
}
