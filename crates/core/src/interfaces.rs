//! Contracts for the services the checkout workflow calls.
//!
//! The workflow owns no catalog, address book, rate table, payment
//! processor, or database. It reaches each of them through one of the traits
//! below, so the same rules run against in-memory fakes in tests and real
//! adapters in the service.
//!
//! Implementations must be bounded: a call either answers or fails with a
//! [`CollaboratorError`]. Nothing in this crate retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::ProductKind;
use crate::error::FieldError;
use crate::order::Order;
use crate::payment::{GatewayResponse, PaymentRequest};
use crate::types::{Address, ChannelSlug, CurrencyCode, Money, OrderId, ShippingMethodId, VariantId};

/// Failure talking to a collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// The call did not finish in time.
    #[error("{service} did not respond within {after:?}")]
    Timeout {
        /// Collaborator name.
        service: &'static str,
        /// Configured limit.
        after: Duration,
    },

    /// The collaborator could not be reached or answered with a fault.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        /// Collaborator name.
        service: &'static str,
        /// Underlying cause.
        reason: String,
    },

    /// The order store already holds an order with this ID.
    #[error("order {0} already exists")]
    Conflict(OrderId),
}

/// A sales channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub slug: ChannelSlug,
    pub currency: CurrencyCode,
}

/// Answer of the address service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressVerdict {
    Accepted,
    Rejected(Vec<FieldError>),
}

/// A delivery option quoted for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub price: Money,
}

/// Catalog / product service.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up the product kind of each variant, in input order.
    ///
    /// `None` marks a variant the catalog does not know.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the catalog cannot answer.
    async fn product_kinds(
        &self,
        variants: &[VariantId],
    ) -> Result<Vec<Option<ProductKind>>, CollaboratorError>;
}

/// Address / channel service.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Find a channel by slug.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the directory cannot answer.
    async fn channel(&self, slug: &ChannelSlug) -> Result<Option<Channel>, CollaboratorError>;

    /// Decide whether the channel serves an address.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the directory cannot answer.
    async fn validate_address(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<AddressVerdict, CollaboratorError>;
}

/// Shipping-rate service.
#[async_trait]
pub trait ShippingRates: Send + Sync {
    /// Every method available for delivery to `address` in `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if rates cannot be fetched.
    async fn available_methods(
        &self,
        channel: &ChannelSlug,
        address: &Address,
    ) -> Result<Vec<ShippingMethod>, CollaboratorError>;
}

/// Payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to pay for the checkout snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] only when the gateway could not give an
    /// answer. Declines are answers and travel inside [`GatewayResponse`].
    async fn process(&self, request: &PaymentRequest) -> Result<GatewayResponse, CollaboratorError>;
}

/// Durable, write-once order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::Conflict`] if the ID is taken.
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError>;

    /// Load an order by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the store cannot answer.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError>;
}
