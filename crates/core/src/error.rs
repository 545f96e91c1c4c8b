//! Checkout error taxonomy.
//!
//! Every failure maps onto one [`ErrorKind`], which tells the caller how to
//! react:
//!
//! | Kind                 | Caller action                                   |
//! |----------------------|-------------------------------------------------|
//! | `NotFound`           | give up on this identifier                      |
//! | `PreconditionFailed` | change checkout state, then retry the operation |
//! | `ValidationFailed`   | fix the input, then retry                       |
//! | `Transient`          | retry with backoff (never retried internally)   |
//!
//! A payment attempt blocked by a missing shipping method is not an error at
//! all: it is a [`crate::PaymentAttempt`] carrying one payment error.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interfaces::CollaboratorError;
use crate::types::{ChannelSlug, CheckoutToken, EmailError, OrderId, VariantId};

/// Recovery class of a [`CheckoutError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    ValidationFailed,
    Transient,
}

/// A completion precondition that does not hold yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
    ShippingAddress,
    ShippingMethod,
    /// No payment attempt yet, or the last one returned errors.
    Payment,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShippingAddress => "shipping address",
            Self::ShippingMethod => "shipping method",
            Self::Payment => "successful payment",
        })
    }
}

/// A single problem attached to an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field, if the problem is tied to one.
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Create an error tied to `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Create an error not tied to any field.
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Errors returned by checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No checkout exists for the token.
    #[error("checkout not found: {0}")]
    CheckoutNotFound(CheckoutToken),

    /// The sales channel is unknown.
    #[error("invalid channel: {0}")]
    InvalidChannel(ChannelSlug),

    /// The catalog does not know the variant.
    #[error("variant not found: {0}")]
    VariantNotFound(VariantId),

    /// No shipping method with this name is available for the checkout.
    #[error("shipping method not found: {0}")]
    ShippingMethodNotFound(String),

    /// No order exists with this ID.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The checkout was already turned into an order.
    #[error("checkout is already completed")]
    CheckoutCompleted,

    /// Completion was requested before every precondition held.
    #[error("checkout is not ready: missing {}", format_requirements(.unmet))]
    CheckoutNotReady {
        /// Every unmet precondition, in workflow order.
        unmet: Vec<Requirement>,
    },

    /// A checkout must keep at least one line.
    #[error("checkout must contain at least one line")]
    EmptyCart,

    /// Quantity outside the accepted range.
    #[error("invalid quantity {quantity} for variant {variant}")]
    InvalidQuantity {
        /// Variant the quantity was given for.
        variant: VariantId,
        /// Rejected quantity.
        quantity: i64,
    },

    /// Contact email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The address was malformed or rejected by the address service.
    #[error("address rejected: {}", format_field_errors(.0))]
    AddressRejected(Vec<FieldError>),

    /// A collaborator timed out or was unavailable.
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),
}

impl CheckoutError {
    /// Recovery class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CheckoutNotFound(_)
            | Self::InvalidChannel(_)
            | Self::VariantNotFound(_)
            | Self::ShippingMethodNotFound(_)
            | Self::OrderNotFound(_) => ErrorKind::NotFound,
            Self::CheckoutCompleted | Self::CheckoutNotReady { .. } => {
                ErrorKind::PreconditionFailed
            }
            Self::EmptyCart
            | Self::InvalidQuantity { .. }
            | Self::InvalidEmail(_)
            | Self::AddressRejected(_) => ErrorKind::ValidationFailed,
            Self::Collaborator(_) => ErrorKind::Transient,
        }
    }

    /// Stable SCREAMING_SNAKE_CASE code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CheckoutNotFound(_) => "CHECKOUT_NOT_FOUND",
            Self::InvalidChannel(_) => "INVALID_CHANNEL",
            Self::VariantNotFound(_) => "VARIANT_NOT_FOUND",
            Self::ShippingMethodNotFound(_) => "SHIPPING_METHOD_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::CheckoutCompleted => "CHECKOUT_COMPLETED",
            Self::CheckoutNotReady { .. } => "CHECKOUT_NOT_READY",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::AddressRejected(_) => "ADDRESS_REJECTED",
            Self::Collaborator(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

fn format_requirements(unmet: &[Requirement]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "(no details provided)".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
