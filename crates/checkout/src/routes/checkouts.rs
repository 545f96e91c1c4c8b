//! Checkout route handlers.
//!
//! Every handler is a thin adapter: parse the path and body, call the
//! [`CheckoutService`](crate::service::CheckoutService), render JSON.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use pineapple_checkout_core::{
    Address, ChannelSlug, Checkout, CheckoutStage, CheckoutToken, CurrencyCode, LineInput,
    LineItem, Order, OrderId, PaymentAttempt, PaymentError, Readiness, ShippingMethod,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub channel: ChannelSlug,
    pub email: String,
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Deserialize)]
pub struct LinesRequest {
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ShippingMethodRequest {
    /// Display name of the method, e.g. `"Standard"`.
    pub name: String,
}

/// Checkout as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutView {
    pub token: CheckoutToken,
    pub channel: ChannelSlug,
    pub currency: CurrencyCode,
    pub email: String,
    pub lines: Vec<LineItem>,
    pub is_shipping_required: bool,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<ShippingMethod>,
    pub payment: Option<PaymentAttempt>,
    pub stage: CheckoutStage,
    pub completed: bool,
    pub order_id: Option<OrderId>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Checkout> for CheckoutView {
    fn from(checkout: &Checkout) -> Self {
        Self {
            token: checkout.token(),
            channel: checkout.channel().clone(),
            currency: checkout.currency(),
            email: checkout.email().to_string(),
            lines: checkout.lines().to_vec(),
            is_shipping_required: checkout.is_shipping_required(),
            billing_address: checkout.billing_address().cloned(),
            shipping_address: checkout.shipping_address().cloned(),
            shipping_method: checkout.shipping_method().cloned(),
            payment: checkout.payment_attempt().cloned(),
            stage: checkout.stage(),
            completed: checkout.is_completed(),
            order_id: checkout.order_id(),
            version: checkout.version(),
            created_at: checkout.created_at(),
            updated_at: checkout.updated_at(),
        }
    }
}

impl From<Checkout> for CheckoutView {
    fn from(checkout: Checkout) -> Self {
        Self::from(&checkout)
    }
}

/// Outcome of a payment attempt.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub errors: Vec<PaymentError>,
}

impl From<PaymentAttempt> for PaymentResponse {
    fn from(attempt: PaymentAttempt) -> Self {
        Self {
            success: attempt.success(),
            errors: attempt.errors,
        }
    }
}

pub(super) fn parse_token(raw: &str) -> Result<CheckoutToken> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid checkout token: {raw}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Start a checkout.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutView>)> {
    let Json(req) = payload?;
    let checkout = state
        .checkouts()
        .create(&req.channel, &req.email, &req.lines)
        .await?;
    Ok((StatusCode::CREATED, Json(checkout.into())))
}

/// Current checkout state.
pub async fn show(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<CheckoutView>> {
    let checkout = state.checkouts().get(parse_token(&token)?).await?;
    Ok(Json(checkout.into()))
}

/// Add lines.
pub async fn add_lines(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<LinesRequest>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(req) = payload?;
    let checkout = state.checkouts().add_lines(token, &req.lines).await?;
    Ok(Json(checkout.into()))
}

/// Set line quantities.
pub async fn update_lines(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<LinesRequest>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(req) = payload?;
    let checkout = state.checkouts().update_lines(token, &req.lines).await?;
    Ok(Json(checkout.into()))
}

/// Replace the contact email.
pub async fn set_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(req) = payload?;
    let checkout = state.checkouts().set_email(token, &req.email).await?;
    Ok(Json(checkout.into()))
}

/// Set the billing address.
pub async fn set_billing_address(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<Address>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(address) = payload?;
    let checkout = state
        .checkouts()
        .set_billing_address(token, address)
        .await?;
    Ok(Json(checkout.into()))
}

/// Set the shipping address.
pub async fn set_shipping_address(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<Address>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(address) = payload?;
    let checkout = state
        .checkouts()
        .set_shipping_address(token, address)
        .await?;
    Ok(Json(checkout.into()))
}

/// Methods offered for the current shipping address.
pub async fn shipping_methods(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Vec<ShippingMethod>>> {
    let methods = state
        .checkouts()
        .available_shipping_methods(parse_token(&token)?)
        .await?;
    Ok(Json(methods))
}

/// Choose a shipping method by name.
pub async fn set_shipping_method(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: std::result::Result<Json<ShippingMethodRequest>, JsonRejection>,
) -> Result<Json<CheckoutView>> {
    let token = parse_token(&token)?;
    let Json(req) = payload?;
    let checkout = state
        .checkouts()
        .resolve_shipping_method(token, &req.name)
        .await?;
    Ok(Json(checkout.into()))
}

/// Attempt payment. Declines are reported in the body with status 200.
pub async fn pay(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PaymentResponse>> {
    let attempt = state
        .checkouts()
        .attempt_payment(parse_token(&token)?)
        .await?;
    Ok(Json(attempt.into()))
}

/// Completion readiness.
pub async fn readiness(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Readiness>> {
    let readiness = state.checkouts().readiness(parse_token(&token)?).await?;
    Ok(Json(readiness))
}

/// Complete the checkout.
pub async fn complete(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.checkouts().complete(parse_token(&token)?).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The order the checkout completed into.
pub async fn order(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Order>> {
    let order = state
        .checkouts()
        .order_for_checkout(parse_token(&token)?)
        .await?;
    Ok(Json(order))
}
