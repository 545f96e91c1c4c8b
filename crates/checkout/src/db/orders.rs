//! `PostgreSQL` order store.

use async_trait::async_trait;
use pineapple_checkout_core::{CollaboratorError, Order, OrderId, OrderStore};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{error, instrument};

const SERVICE: &str = "order store";

/// Order store backed by the `orders` table.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: &sqlx::Error) -> CollaboratorError {
    error!(error = %e, "Order store query failed");
    CollaboratorError::Unavailable {
        service: SERVICE,
        reason: e.to_string(),
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn insert(&self, order: &Order) -> Result<(), CollaboratorError> {
        sqlx::query(
            r"
            INSERT INTO orders (
                id, checkout_id, checkout_token, status, channel, email,
                is_shipping_required, payload, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(order.id())
        .bind(order.checkout_id())
        .bind(order.checkout_token())
        .bind(order.status().as_str())
        .bind(order.channel().as_str())
        .bind(order.email().as_str())
        .bind(order.is_shipping_required())
        .bind(Json(order))
        .bind(order.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return CollaboratorError::Conflict(order.id());
            }
            unavailable(&e)
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: OrderId) -> Result<Option<Order>, CollaboratorError> {
        let row: Option<(Json<Order>,)> =
            sqlx::query_as("SELECT payload FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| unavailable(&e))?;
        Ok(row.map(|(Json(order),)| order))
    }
}
