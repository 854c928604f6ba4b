//! HTTP handlers for payment endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{payments_error_response, ErrorResponse};
use crate::application::handlers::payments::{
    CreateTicketIntentCommand, CreateTicketIntentHandler, CreateTipIntentCommand,
    CreateTipIntentHandler, ProcessRefundCommand, ProcessRefundHandler,
};
use crate::domain::ids::{EventId, UserId};

use super::dto::{EventIntentRequest, IntentResponse, RefundRequest, RefundResponse, TipIntentRequest};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PaymentHandlers {
    ticket_handler: Arc<CreateTicketIntentHandler>,
    tip_handler: Arc<CreateTipIntentHandler>,
    refund_handler: Arc<ProcessRefundHandler>,
}

impl PaymentHandlers {
    pub fn new(
        ticket_handler: Arc<CreateTicketIntentHandler>,
        tip_handler: Arc<CreateTipIntentHandler>,
        refund_handler: Arc<ProcessRefundHandler>,
    ) -> Self {
        Self {
            ticket_handler,
            tip_handler,
            refund_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/event-intent - Issue a ticket payment intent
pub async fn create_event_intent(
    State(handlers): State<PaymentHandlers>,
    Json(req): Json<EventIntentRequest>,
) -> Response {
    let (event_id, user_id) = match (EventId::new(req.event_id), UserId::new(req.user_id)) {
        (Ok(e), Ok(u)) => (e, u),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("event_id and user_id are required")),
            )
                .into_response()
        }
    };

    let cmd = CreateTicketIntentCommand { event_id, user_id };

    match handlers.ticket_handler.handle(cmd).await {
        Ok(result) => (
            StatusCode::CREATED,
            Json(IntentResponse::from_parts(&result.intent, &result.breakdown)),
        )
            .into_response(),
        Err(e) => payments_error_response(e),
    }
}

/// POST /api/payments/tip-intent - Issue a tip payment intent
pub async fn create_tip_intent(
    State(handlers): State<PaymentHandlers>,
    Json(req): Json<TipIntentRequest>,
) -> Response {
    let (host_id, user_id) = match (UserId::new(req.host_id), UserId::new(req.user_id)) {
        (Ok(h), Ok(u)) => (h, u),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("host_id and user_id are required")),
            )
                .into_response()
        }
    };

    let event_id = match req.event_id {
        None => None,
        Some(raw) => match EventId::new(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::bad_request("event_id must not be empty")),
                )
                    .into_response()
            }
        },
    };

    let cmd = CreateTipIntentCommand {
        host_id,
        user_id,
        amount: req.amount,
        event_id,
        message: req.message,
    };

    match handlers.tip_handler.handle(cmd).await {
        Ok(result) => (
            StatusCode::CREATED,
            Json(IntentResponse::from_parts(&result.intent, &result.breakdown)),
        )
            .into_response(),
        Err(e) => payments_error_response(e),
    }
}

/// POST /api/payments/refund - Refund a cancelled ticket
pub async fn process_refund(
    State(handlers): State<PaymentHandlers>,
    Json(req): Json<RefundRequest>,
) -> Response {
    let (event_id, user_id) = match (EventId::new(req.event_id), UserId::new(req.user_id)) {
        (Ok(e), Ok(u)) => (e, u),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("event_id and user_id are required")),
            )
                .into_response()
        }
    };

    let cmd = ProcessRefundCommand {
        event_id,
        user_id,
        actor: req.actor,
    };

    match handlers.refund_handler.handle(cmd).await {
        Ok(result) => {
            let response = RefundResponse {
                refund_amount: result.refund_amount,
                fraction: result.fraction,
                breakdown_source: RefundResponse::source_of(&result.recovered).to_string(),
                refund_id: result.refund.map(|r| r.id),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => payments_error_response(e),
    }
}
