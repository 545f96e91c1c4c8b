//! In-memory order store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pineapple_checkout_core::{CollaboratorError, Order, OrderId, OrderStore};
use tokio::sync::RwLock;

/// Write-once order map shared between clones.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError> {
        let mut orders = self.orders.write().await;
        let duplicate = orders.contains_key(&order.id())
            || orders.values().any(|o| o.checkout_id() == order.checkout_id());
        if duplicate {
            return Err(CollaboratorError::Conflict(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }
}
