//! Naked Pineapple Checkout Core - checkout workflow rules.
//!
//! This crate decides how a cart of line items becomes an order:
//!
//! - [`classifier`] - whether a set of lines needs physical shipping
//! - [`checkout`] - the mutable checkout aggregate
//! - [`gate`] - ordering rules between shipping address, shipping method
//!   and payment
//! - [`completion`] - the one-way transition from checkout to [`Order`]
//!
//! # Architecture
//!
//! The core crate performs no I/O. Catalog, address, shipping-rate, payment
//! and order-store services are reached through the traits in
//! [`interfaces`]; the `pineapple-checkout` service supplies the adapters,
//! timeouts and per-checkout locking.
//!
//! ```text
//! Draft -> AddressPending -> MethodPending -> PaymentPending -> PaymentReady -> Completed
//!      \______________ digital-only checkouts ______________/
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod classifier;
pub mod completion;
pub mod error;
pub mod gate;
pub mod interfaces;
pub mod order;
pub mod payment;
pub mod types;

#[cfg(test)]
mod testing;

pub use checkout::Checkout;
pub use classifier::{LineInput, LineItem, ProductKind, QuantityRule, is_shipping_required};
pub use error::{CheckoutError, ErrorKind, FieldError, Requirement};
pub use gate::Readiness;
pub use interfaces::{
    AddressVerdict, Catalog, Channel, ChannelDirectory, CollaboratorError, OrderStore,
    PaymentGateway, ShippingMethod, ShippingRates,
};
pub use order::Order;
pub use payment::{GatewayResponse, PaymentAttempt, PaymentError, PaymentErrorCode, PaymentRequest};
pub use types::*;
