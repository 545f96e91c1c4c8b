//! Collaborator adapters.
//!
//! The core workflow talks to catalog, channel, shipping-rate, payment and
//! order-store services through traits. This module provides the concrete
//! implementations and the decorators stacked on top of them:
//!
//! ```text
//! Bounded(timeout) -> CachedShippingRates -> SeededStore
//! Bounded(timeout) -> HttpPaymentGateway | DummyGateway
//! Bounded(timeout) -> PgOrderStore | MemoryOrderStore
//! ```

pub mod bounded;
pub mod payment;
pub mod shipping_cache;
pub mod store;

pub use bounded::Bounded;
pub use payment::{DummyGateway, HttpPaymentGateway};
pub use shipping_cache::CachedShippingRates;
pub use store::SeededStore;
