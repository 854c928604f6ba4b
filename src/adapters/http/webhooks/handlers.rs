//! HTTP handlers for Stripe webhook endpoints.
//!
//! Both endpoints read the raw body (the signature covers the exact bytes)
//! and the `Stripe-Signature` header. Verified-but-irrelevant events are
//! acknowledged with 200 so the gateway stops redelivering; only signature
//! failures and internal errors answer non-2xx.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{payments_error_response, ErrorResponse};
use crate::adapters::http::payments::WebhookAck;
use crate::application::handlers::connect::{HandleConnectWebhookCommand, HandleConnectWebhookHandler};
use crate::application::handlers::payments::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
};
use crate::application::handlers::WebhookOutcome;

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct WebhookHandlers {
    payment_handler: Arc<HandlePaymentWebhookHandler>,
    connect_handler: Arc<HandleConnectWebhookHandler>,
}

impl WebhookHandlers {
    pub fn new(
        payment_handler: Arc<HandlePaymentWebhookHandler>,
        connect_handler: Arc<HandleConnectWebhookHandler>,
    ) -> Self {
        Self {
            payment_handler,
            connect_handler,
        }
    }
}

fn stripe_signature(headers: &HeaderMap) -> Option<&str> {
    headers.get("stripe-signature").and_then(|v| v.to_str().ok())
}

fn ack(outcome: WebhookOutcome) -> Response {
    let body = match outcome {
        WebhookOutcome::Recorded { .. } => WebhookAck::recorded(),
        WebhookOutcome::Ignored { .. } => WebhookAck::ignored(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe/payments - Payment events
pub async fn stripe_payment_webhook(
    State(handlers): State<WebhookHandlers>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = stripe_signature(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("missing Stripe-Signature header")),
        )
            .into_response();
    };

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match handlers.payment_handler.handle(cmd).await {
        Ok(outcome) => ack(outcome),
        Err(e) => payments_error_response(e),
    }
}

/// POST /api/webhooks/stripe/connect - Connect account events
pub async fn stripe_connect_webhook(
    State(handlers): State<WebhookHandlers>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = stripe_signature(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("missing Stripe-Signature header")),
        )
            .into_response();
    };

    let cmd = HandleConnectWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match handlers.connect_handler.handle(cmd).await {
        Ok(outcome) => ack(outcome),
        Err(e) => payments_error_response(e),
    }
}
