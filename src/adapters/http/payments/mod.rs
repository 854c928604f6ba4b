//! Payment HTTP endpoints: intent issuance and refunds.

mod dto;
mod handlers;
mod routes;

pub use dto::{IntentResponse, RefundResponse, WebhookAck};
pub use handlers::PaymentHandlers;
pub use routes::payment_routes;
