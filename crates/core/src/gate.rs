//! Validation gate.
//!
//! Enforces the ordering between shipping address, shipping method and
//! payment:
//!
//! - a shipping method exists only for a checkout with a shipping address
//! - payment cannot succeed for goods that must ship until a method is set
//! - completion needs the shipping fields its class requires plus a payment
//!   attempt without errors
//!
//! [`resolve_shipping_method`] is the only code path that assigns a shipping
//! method, and it goes through the same address guard as
//! [`available_shipping_methods`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::checkout::Checkout;
use crate::error::{CheckoutError, Requirement};
use crate::interfaces::{PaymentGateway, ShippingMethod, ShippingRates};
use crate::payment::{PaymentAttempt, PaymentError, PaymentRequest};
use crate::types::CheckoutStage;

/// Completion readiness of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    pub stage: CheckoutStage,
    pub unmet: Vec<Requirement>,
}

/// Methods the shipping-rate service offers for the checkout's shipping
/// address. Empty when no shipping address is set.
///
/// # Errors
///
/// Returns [`CheckoutError::Collaborator`] if the rate service cannot answer.
pub async fn available_shipping_methods(
    checkout: &Checkout,
    rates: &dyn ShippingRates,
) -> Result<Vec<ShippingMethod>, CheckoutError> {
    let Some(address) = checkout.shipping_address() else {
        debug!(token = %checkout.token(), "No shipping address, no shipping methods");
        return Ok(Vec::new());
    };
    Ok(rates.available_methods(checkout.channel(), address).await?)
}

/// Find the method named `method_name` for the checkout's shipping address
/// and assign it.
///
/// # Errors
///
/// - [`CheckoutError::CheckoutCompleted`] on a completed checkout
/// - [`CheckoutError::ShippingMethodNotFound`] if no shipping address is set,
///   or no method with that name is offered for it
/// - [`CheckoutError::Collaborator`] if the rate service cannot answer
#[instrument(skip(checkout, rates), fields(token = %checkout.token()))]
pub async fn resolve_shipping_method(
    checkout: &mut Checkout,
    method_name: &str,
    rates: &dyn ShippingRates,
) -> Result<ShippingMethod, CheckoutError> {
    checkout.ensure_open()?;

    let method = available_shipping_methods(checkout, rates)
        .await?
        .into_iter()
        .find(|m| m.name == method_name)
        .ok_or_else(|| CheckoutError::ShippingMethodNotFound(method_name.to_string()))?;

    checkout.set_shipping_method(method.clone())?;
    info!(method = %method.id, "Shipping method resolved");
    Ok(method)
}

/// Attempt payment and record the outcome on the checkout.
///
/// A checkout that must ship but has no shipping method gets exactly one
/// [`PaymentErrorCode::ShippingMethodRequired`](crate::PaymentErrorCode)
/// error and the gateway is not called. Otherwise the gateway's errors are
/// recorded as returned.
///
/// # Errors
///
/// - [`CheckoutError::CheckoutCompleted`] on a completed checkout
/// - [`CheckoutError::Collaborator`] if the gateway gave no answer; the
///   checkout is left unchanged
#[instrument(skip(checkout, gateway), fields(token = %checkout.token()))]
pub async fn attempt_payment(
    checkout: &mut Checkout,
    gateway: &dyn PaymentGateway,
) -> Result<PaymentAttempt, CheckoutError> {
    checkout.ensure_open()?;

    let errors = if checkout.is_shipping_required() && checkout.shipping_method().is_none() {
        vec![PaymentError::shipping_method_required()]
    } else {
        let request = PaymentRequest::from(&*checkout);
        gateway.process(&request).await?.into_errors()
    };

    let attempt = PaymentAttempt::new(errors);
    checkout.record_payment(attempt.clone())?;
    info!(
        success = attempt.success(),
        errors = attempt.errors.len(),
        "Payment attempted"
    );
    Ok(attempt)
}

/// Completion preconditions that do not hold, in workflow order.
#[must_use]
pub fn unmet_requirements(checkout: &Checkout) -> Vec<Requirement> {
    let mut unmet = Vec::new();
    if checkout.is_shipping_required() {
        if checkout.shipping_address().is_none() {
            unmet.push(Requirement::ShippingAddress);
        }
        if checkout.shipping_method().is_none() {
            unmet.push(Requirement::ShippingMethod);
        }
    }
    if !checkout.payment_attempt().is_some_and(PaymentAttempt::success) {
        unmet.push(Requirement::Payment);
    }
    unmet
}

/// `true` iff shipping is satisfied for the checkout's class and the last
/// payment attempt had no errors.
#[must_use]
pub fn can_complete(checkout: &Checkout) -> bool {
    unmet_requirements(checkout).is_empty()
}

/// Readiness summary for callers.
#[must_use]
pub fn readiness(checkout: &Checkout) -> Readiness {
    let unmet = if checkout.is_completed() {
        Vec::new()
    } else {
        unmet_requirements(checkout)
    };
    Readiness {
        ready: !checkout.is_completed() && unmet.is_empty(),
        stage: checkout.stage(),
        unmet,
    }
}
