//! In-memory collaborators and fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::classifier::{LineItem, ProductKind};
use crate::interfaces::{
    Catalog, Channel, CollaboratorError, OrderStore, PaymentGateway, ShippingMethod, ShippingRates,
};
use crate::order::Order;
use crate::payment::{GatewayResponse, PaymentError, PaymentRequest};
use crate::types::{
    Address, ChannelSlug, CurrencyCode, Email, Money, OrderId, ShippingMethodId, VariantId,
};

pub fn channel() -> Channel {
    Channel {
        slug: ChannelSlug::new("default-channel"),
        currency: CurrencyCode::USD,
    }
}

pub fn email() -> Email {
    Email::parse("buyer@example.com").unwrap()
}

pub fn physical(variant: &str, quantity: u32) -> LineItem {
    LineItem {
        variant_id: VariantId::new(variant),
        quantity,
        is_digital: false,
    }
}

pub fn digital(variant: &str, quantity: u32) -> LineItem {
    LineItem {
        variant_id: VariantId::new(variant),
        quantity,
        is_digital: true,
    }
}

pub fn shipping_address() -> Address {
    Address {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        company_name: None,
        street_address_1: "1470 Pinewood Avenue".to_string(),
        street_address_2: None,
        city: "Michigan City".to_string(),
        city_area: None,
        postal_code: "49360".to_string(),
        country: "US".to_string(),
        country_area: Some("MI".to_string()),
        phone: None,
    }
}

pub fn standard_method() -> ShippingMethod {
    ShippingMethod {
        id: ShippingMethodId::new("standard"),
        name: "Standard".to_string(),
        price: Money::new(Decimal::new(500, 2), CurrencyCode::USD),
    }
}

/// Knows `mug` and `poster` (physical) and `ebook`, `song`, `gift-card` (digital).
#[derive(Default)]
pub struct FakeCatalog;

#[async_trait]
impl Catalog for FakeCatalog {
    async fn product_kinds(
        &self,
        variants: &[VariantId],
    ) -> Result<Vec<Option<ProductKind>>, CollaboratorError> {
        Ok(variants
            .iter()
            .map(|v| match v.as_str() {
                "mug" | "poster" => Some(ProductKind::Physical),
                "ebook" | "song" | "gift-card" => Some(ProductKind::Digital),
                _ => None,
            })
            .collect())
    }
}

/// Ships to US addresses only, offering "Standard" and "Express".
#[derive(Default)]
pub struct FakeRates {
    calls: AtomicUsize,
}

impl FakeRates {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShippingRates for FakeRates {
    async fn available_methods(
        &self,
        _channel: &ChannelSlug,
        address: &Address,
    ) -> Result<Vec<ShippingMethod>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if address.country != "US" {
            return Ok(Vec::new());
        }
        Ok(vec![standard_method(), ShippingMethod {
            id: ShippingMethodId::new("express"),
            name: "Express".to_string(),
            price: Money::new(Decimal::new(1500, 2), CurrencyCode::USD),
        }])
    }
}

enum GatewayMode {
    Approve,
    Decline(Vec<PaymentError>),
    Unavailable,
}

pub struct FakeGateway {
    mode: GatewayMode,
    calls: AtomicUsize,
}

impl FakeGateway {
    fn with_mode(mode: GatewayMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn approving() -> Self {
        Self::with_mode(GatewayMode::Approve)
    }

    pub fn declining(errors: Vec<PaymentError>) -> Self {
        Self::with_mode(GatewayMode::Decline(errors))
    }

    pub fn unavailable() -> Self {
        Self::with_mode(GatewayMode::Unavailable)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn process(
        &self,
        _request: &PaymentRequest,
    ) -> Result<GatewayResponse, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            GatewayMode::Approve => Ok(GatewayResponse::approved()),
            GatewayMode::Decline(errors) => Ok(GatewayResponse::declined(errors.clone())),
            GatewayMode::Unavailable => Err(CollaboratorError::Unavailable {
                service: "payment gateway",
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    failing: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            orders: Mutex::default(),
            failing: true,
        }
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError> {
        if self.failing {
            return Err(CollaboratorError::Unavailable {
                service: "order store",
                reason: "disk full".to_string(),
            });
        }
        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&order.id()) {
            return Err(CollaboratorError::Conflict(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }
}
