//! Order inspection.

use pineapple_checkout::db::{PgOrderStore, create_pool};
use pineapple_checkout_core::{CollaboratorError, OrderId, OrderStore};
use tracing::info;

/// Errors inspecting orders.
#[derive(Debug, thiserror::Error)]
pub enum OrdersError {
    #[error("Invalid order id '{0}'")]
    InvalidId(String),

    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Connect(#[from] super::migrate::MigrationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] CollaboratorError),

    #[error("Failed to render order: {0}")]
    Render(#[from] serde_json::Error),
}

/// Print an order from the order store as pretty JSON.
///
/// # Errors
///
/// Returns `OrdersError` if the ID is malformed, the order does not exist,
/// or the database cannot be reached.
pub async fn show(id: &str) -> Result<(), OrdersError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| OrdersError::InvalidId(id.to_string()))?;

    let pool = create_pool(&super::database_url()?).await?;
    let store = PgOrderStore::new(pool);

    info!(order_id = %order_id, "Loading order");
    let order = store
        .get(order_id)
        .await?
        .ok_or(OrdersError::NotFound(order_id))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&order)?);
    }
    Ok(())
}
