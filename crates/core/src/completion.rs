//! Completion transition: checkout in, order out.
//!
//! Completion is all-or-nothing. The checkout is marked completed only after
//! the order store has accepted the order, and nothing awaits between those
//! two steps, so a cancelled or timed-out call leaves the checkout exactly as
//! it was.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::checkout::Checkout;
use crate::error::CheckoutError;
use crate::gate;
use crate::interfaces::{CollaboratorError, OrderStore};
use crate::order::Order;

/// Turn a ready checkout into an `UNFULFILLED` order.
///
/// The order ID is derived from the checkout ID. If the store already holds
/// that order (an earlier attempt persisted it but never returned), it is
/// adopted instead of writing a second one, provided it matches the checkout
/// as it stands now.
///
/// # Errors
///
/// - [`CheckoutError::CheckoutCompleted`] if the checkout already completed
/// - [`CheckoutError::CheckoutNotReady`] listing every unmet precondition
/// - [`CheckoutError::Collaborator`] if the order store fails, or holds a
///   different order under this checkout's order ID
#[instrument(skip(checkout, store), fields(token = %checkout.token()))]
pub async fn complete(
    checkout: &mut Checkout,
    store: &dyn OrderStore,
) -> Result<Order, CheckoutError> {
    checkout.ensure_open()?;

    let unmet = gate::unmet_requirements(checkout);
    if !unmet.is_empty() {
        return Err(CheckoutError::CheckoutNotReady { unmet });
    }

    let order = Order::snapshot(checkout, Utc::now());
    let order = match store.insert(&order).await {
        Ok(()) => order,
        Err(CollaboratorError::Conflict(id)) => {
            let existing = store
                .get(id)
                .await?
                .ok_or(CollaboratorError::Conflict(id))?;
            adopt(checkout, &existing)?;
            return Ok(existing);
        }
        Err(e) => return Err(e.into()),
    };

    checkout.mark_completed(order.id());
    info!(
        order_id = %order.id(),
        is_shipping_required = order.is_shipping_required(),
        "Checkout completed"
    );
    Ok(order)
}

/// Mark `checkout` completed by an order that is already stored.
///
/// Used when an earlier completion persisted `order` but its caller never
/// learned the outcome.
///
/// # Errors
///
/// - [`CheckoutError::CheckoutCompleted`] if the checkout already completed
/// - [`CheckoutError::Collaborator`] with [`CollaboratorError::Conflict`] if
///   `order` is not a snapshot of the checkout
pub fn adopt(checkout: &mut Checkout, order: &Order) -> Result<(), CheckoutError> {
    checkout.ensure_open()?;
    if !order.is_snapshot_of(checkout) {
        warn!(order_id = %order.id(), "Stored order does not match checkout");
        return Err(CollaboratorError::Conflict(order.id()).into());
    }

    checkout.mark_completed(order.id());
    warn!(order_id = %order.id(), "Order already stored for checkout, adopting it");
    Ok(())
}
