//! HTTP routes for payment endpoints.

use axum::{routing::post, Router};

use super::handlers::{create_event_intent, create_tip_intent, process_refund, PaymentHandlers};

/// Creates the payments router with all endpoints.
pub fn payment_routes(handlers: PaymentHandlers) -> Router {
    Router::new()
        .route("/event-intent", post(create_event_intent))
        .route("/tip-intent", post(create_tip_intent))
        .route("/refund", post(process_refund))
        .with_state(handlers)
}
