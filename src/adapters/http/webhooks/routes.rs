//! HTTP routes for Stripe webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{stripe_connect_webhook, stripe_payment_webhook, WebhookHandlers};

/// Creates the webhook router; mounted under `/api/webhooks/stripe`.
pub fn webhook_routes(handlers: WebhookHandlers) -> Router {
    Router::new()
        .route("/payments", post(stripe_payment_webhook))
        .route("/connect", post(stripe_connect_webhook))
        .with_state(handlers)
}
