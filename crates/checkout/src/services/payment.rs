//! Payment gateway adapters.
//!
//! - [`DummyGateway`] answers locally; used in development and tests
//! - [`HttpPaymentGateway`] posts the checkout snapshot to a remote gateway

use std::sync::Arc;

use async_trait::async_trait;
use pineapple_checkout_core::{
    CollaboratorError, GatewayResponse, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentRequest,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::PaymentGatewayConfig;

const SERVICE: &str = "payment gateway";

// =============================================================================
// Dummy gateway
// =============================================================================

/// Local gateway with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct DummyGateway {
    decline: Option<String>,
}

impl DummyGateway {
    /// A gateway that approves every payment.
    #[must_use]
    pub const fn approving() -> Self {
        Self { decline: None }
    }

    /// A gateway that declines every payment with `message`.
    #[must_use]
    pub fn declining(message: impl Into<String>) -> Self {
        Self {
            decline: Some(message.into()),
        }
    }
}

#[async_trait]
impl PaymentGateway for DummyGateway {
    async fn process(&self, request: &PaymentRequest) -> Result<GatewayResponse, CollaboratorError> {
        debug!(checkout_id = %request.checkout_id, "Dummy gateway processing payment");
        Ok(self.decline.as_ref().map_or_else(GatewayResponse::approved, |message| {
            GatewayResponse::declined(vec![PaymentError {
                code: PaymentErrorCode::PaymentDeclined,
                field: None,
                message: message.clone(),
            }])
        }))
    }
}

// =============================================================================
// HTTP gateway
// =============================================================================

/// Client for a JSON payment gateway.
///
/// Sends the [`PaymentRequest`] as the body of a `POST` with a bearer key
/// and expects `{"success": bool, "errors": [...]}` back. Declines may come
/// with any 4xx status as long as the body has that shape.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    inner: Arc<HttpPaymentGatewayInner>,
}

struct HttpPaymentGatewayInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl HttpPaymentGateway {
    #[must_use]
    pub fn new(config: &PaymentGatewayConfig) -> Self {
        Self {
            inner: Arc::new(HttpPaymentGatewayInner {
                client: reqwest::Client::new(),
                endpoint: config.url.clone(),
                api_key: config.api_key.clone(),
            }),
        }
    }
}

fn unavailable(reason: impl Into<String>) -> CollaboratorError {
    CollaboratorError::Unavailable {
        service: SERVICE,
        reason: reason.into(),
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(checkout_id = %request.checkout_id))]
    async fn process(&self, request: &PaymentRequest) -> Result<GatewayResponse, CollaboratorError> {
        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Payment gateway request failed");
                unavailable(e.to_string())
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!(status = %status, "Payment gateway unavailable");
            return Err(unavailable(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        match serde_json::from_str::<GatewayResponse>(&body) {
            Ok(answer) => {
                if !answer.success {
                    warn!(
                        status = %status,
                        errors = answer.errors.len(),
                        "Payment gateway declined payment"
                    );
                }
                Ok(answer)
            }
            Err(e) => {
                error!(
                    status = %status,
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse payment gateway response"
                );
                Err(unavailable(format!("HTTP {status}: unreadable response")))
            }
        }
    }
}
