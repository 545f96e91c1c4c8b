//! HTTP route handlers for the checkout API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Health check
//!
//! # Checkouts
//! POST /checkouts                            - Start a checkout
//! GET  /checkouts/{token}                    - Checkout state
//! POST /checkouts/{token}/lines              - Add lines
//! PUT  /checkouts/{token}/lines              - Set line quantities (0 removes)
//! PUT  /checkouts/{token}/email              - Replace contact email
//! PUT  /checkouts/{token}/billing-address    - Set billing address
//! PUT  /checkouts/{token}/shipping-address   - Set shipping address
//! GET  /checkouts/{token}/shipping-methods   - Methods for the shipping address
//! PUT  /checkouts/{token}/shipping-method    - Choose a method by name
//! POST /checkouts/{token}/payment            - Attempt payment
//! GET  /checkouts/{token}/readiness          - Completion readiness
//! POST /checkouts/{token}/complete           - Complete into an order
//! GET  /checkouts/{token}/order              - Order the checkout completed into
//!
//! # Orders
//! GET  /orders/{id}                          - Order by ID
//! ```

pub mod checkouts;
pub mod orders;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{make_request_span, request_id_middleware};
use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkouts::create))
        .route("/{token}", get(checkouts::show))
        .route(
            "/{token}/lines",
            post(checkouts::add_lines).put(checkouts::update_lines),
        )
        .route("/{token}/email", put(checkouts::set_email))
        .route(
            "/{token}/billing-address",
            put(checkouts::set_billing_address),
        )
        .route(
            "/{token}/shipping-address",
            put(checkouts::set_shipping_address),
        )
        .route("/{token}/shipping-methods", get(checkouts::shipping_methods))
        .route(
            "/{token}/shipping-method",
            put(checkouts::set_shipping_method),
        )
        .route("/{token}/payment", post(checkouts::pay))
        .route("/{token}/readiness", get(checkouts::readiness))
        .route("/{token}/complete", post(checkouts::complete))
        .route("/{token}/order", get(checkouts::order))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(orders::show))
}

/// Create all routes for the checkout API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/checkouts", checkout_routes())
        .nest("/orders", order_routes())
}

/// Routes plus request tracing and request IDs, bound to `state`.
pub fn app(state: AppState) -> Router {
    routes()
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
