//! HTTP middleware stack for the checkout API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span, see [`request_id::make_request_span`])
//! 3. Request ID (fill span field, tag Sentry scope, echo header)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, make_request_span, request_id_middleware};
