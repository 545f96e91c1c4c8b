//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use pineapple_checkout_core::{Order, OrderId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Load an order by ID.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    let id: OrderId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid order id: {id}")))?;
    let order = state.checkouts().order(id).await?;
    Ok(Json(order))
}
