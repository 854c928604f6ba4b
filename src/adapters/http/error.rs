//! HTTP mapping for `PaymentsError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::errors::PaymentsError;

/// Structured error body returned by every payments endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

/// Map a handler error to its response.
///
/// One non-obvious case: invalid webhook signatures answer 400 so the gateway
/// keeps retrying a delivery that may have been corrupted in transit.
pub fn payments_error_response(error: PaymentsError) -> Response {
    let (status, code) = match &error {
        PaymentsError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        PaymentsError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        PaymentsError::HostNotPayable(_) => (StatusCode::BAD_REQUEST, "HOST_NOT_PAYABLE"),
        PaymentsError::AlreadyConnected(_) => (StatusCode::CONFLICT, "ALREADY_CONNECTED"),
        PaymentsError::AmountBelowMinimum { .. } => {
            (StatusCode::BAD_REQUEST, "AMOUNT_BELOW_MINIMUM")
        }
        PaymentsError::SignatureInvalid(_) => (StatusCode::BAD_REQUEST, "SIGNATURE_INVALID"),
        PaymentsError::Gateway(_) => (StatusCode::INTERNAL_SERVER_ERROR, "GATEWAY_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(error = %error, "Payments request failed");
    } else {
        tracing::debug!(error = %error, "Payments request rejected");
    }

    (status, Json(ErrorResponse::new(code, error.message()))).into_response()
}
