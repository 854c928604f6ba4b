//! Payment command handlers: intent issuance, webhook reconciliation, refunds.

mod create_ticket_intent;
mod create_tip_intent;
mod handle_payment_webhook;
mod process_refund;

pub use create_ticket_intent::{
    CreateTicketIntentCommand, CreateTicketIntentHandler, CreateTicketIntentResult,
};
pub use create_tip_intent::{CreateTipIntentCommand, CreateTipIntentHandler, CreateTipIntentResult};
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};
pub use process_refund::{ProcessRefundCommand, ProcessRefundHandler, ProcessRefundResult};
