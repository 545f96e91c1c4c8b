//! Status enums for checkouts and orders.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
///
/// Every order starts as [`OrderStatus::Unfulfilled`]; the later values are
/// written by the fulfillment side, never by checkout completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Returned,
    Canceled,
}

impl OrderStatus {
    /// The SCREAMING_SNAKE_CASE wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unfulfilled => "UNFULFILLED",
            Self::PartiallyFulfilled => "PARTIALLY_FULFILLED",
            Self::Fulfilled => "FULFILLED",
            Self::Returned => "RETURNED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNFULFILLED" => Ok(Self::Unfulfilled),
            "PARTIALLY_FULFILLED" => Ok(Self::PartiallyFulfilled),
            "FULFILLED" => Ok(Self::Fulfilled),
            "RETURNED" => Ok(Self::Returned),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Where a checkout sits in the fulfillment workflow.
///
/// ```text
/// Draft -> AddressPending -> MethodPending -> PaymentPending -> PaymentReady -> Completed
/// ```
///
/// Digital-only checkouts never enter `AddressPending` or `MethodPending`.
/// The stage is derived from the checkout's fields on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStage {
    /// No lines yet.
    Draft,
    /// Shipping is required but no shipping address is set.
    AddressPending,
    /// Shipping address set, shipping method missing.
    MethodPending,
    /// Shipping satisfied (or not required); no successful payment attempt.
    PaymentPending,
    /// Every completion precondition holds.
    PaymentReady,
    /// Terminal.
    Completed,
}

impl CheckoutStage {
    /// Whether no further transitions can leave this stage.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
