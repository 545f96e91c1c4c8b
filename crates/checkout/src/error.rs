//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error renders as
//!
//! ```json
//! {"errors": [{"code": "CHECKOUT_NOT_READY", "message": "...", "field": null}]}
//! ```
//!
//! with the HTTP status taken from the error's [`ErrorKind`]. Transient and
//! internal failures are captured to Sentry before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pineapple_checkout_core::{CheckoutError, ErrorKind, Requirement};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level error type for the checkout API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A checkout operation failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Path segment or request body could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// One entry of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::PreconditionFailed => StatusCode::CONFLICT,
                ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Vec<ErrorDetail> {
        match self {
            Self::Checkout(CheckoutError::AddressRejected(fields)) if !fields.is_empty() => fields
                .iter()
                .map(|f| ErrorDetail {
                    code: "ADDRESS_REJECTED".to_string(),
                    message: f.message.clone(),
                    field: f.field.clone(),
                })
                .collect(),
            Self::Checkout(CheckoutError::CheckoutNotReady { unmet }) => unmet
                .iter()
                .map(|r| ErrorDetail {
                    code: "CHECKOUT_NOT_READY".to_string(),
                    message: format!("Missing {r}"),
                    field: Some(requirement_field(*r).to_string()),
                })
                .collect(),
            // Don't expose collaborator internals to clients
            Self::Checkout(err) if err.kind() == ErrorKind::Transient => vec![ErrorDetail {
                code: err.code().to_string(),
                message: "A dependent service is unavailable, please retry".to_string(),
                field: None,
            }],
            Self::Checkout(err) => vec![ErrorDetail {
                code: err.code().to_string(),
                message: err.to_string(),
                field: checkout_error_field(err).map(String::from),
            }],
            Self::BadRequest(msg) => vec![ErrorDetail {
                code: "BAD_REQUEST".to_string(),
                message: msg.clone(),
                field: None,
            }],
            Self::Internal(_) => vec![ErrorDetail {
                code: "INTERNAL".to_string(),
                message: "Internal server error".to_string(),
                field: None,
            }],
        }
    }
}

const fn requirement_field(requirement: Requirement) -> &'static str {
    match requirement {
        Requirement::ShippingAddress => "shipping_address",
        Requirement::ShippingMethod => "shipping_method",
        Requirement::Payment => "payment",
    }
}

const fn checkout_error_field(err: &CheckoutError) -> Option<&'static str> {
    match err {
        CheckoutError::InvalidChannel(_) => Some("channel"),
        CheckoutError::VariantNotFound(_) | CheckoutError::InvalidQuantity { .. } => {
            Some("lines")
        }
        CheckoutError::ShippingMethodNotFound(_) => Some("shipping_method"),
        CheckoutError::InvalidEmail(_) => Some("email"),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            errors: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
