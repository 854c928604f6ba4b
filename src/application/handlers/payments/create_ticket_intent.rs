//! CreateTicketIntentHandler - issues a payment intent for an event ticket.

use std::sync::Arc;

use crate::domain::errors::PaymentsError;
use crate::domain::fees::{FeeBreakdown, FeeCalculator};
use crate::domain::ids::{EventId, UserId};
use crate::domain::payment::{IntentMetadata, PaymentIntent, PaymentKind};
use crate::ports::{CreateIntentRequest, EventStore, PaymentGateway, TransferSpec, UserStore};

/// Command to start a ticket purchase.
#[derive(Debug, Clone)]
pub struct CreateTicketIntentCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of a successfully issued intent.
#[derive(Debug, Clone)]
pub struct CreateTicketIntentResult {
    pub intent: PaymentIntent,
    pub breakdown: FeeBreakdown,
}

/// Handler for issuing ticket payment intents.
///
/// Every precondition is checked before the gateway is called, so a rejected
/// purchase never leaves a dangling intent. The fee breakdown computed here is
/// embedded in the intent metadata; the webhook reconciler reads it back
/// rather than recomputing.
pub struct CreateTicketIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    calculator: FeeCalculator,
}

impl CreateTicketIntentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        calculator: FeeCalculator,
    ) -> Self {
        Self {
            gateway,
            users,
            events,
            calculator,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateTicketIntentCommand,
    ) -> Result<CreateTicketIntentResult, PaymentsError> {
        // 1. The event must exist and be paid.
        let event = self
            .events
            .find_event(&cmd.event_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("event", cmd.event_id.to_string()))?;

        if event.price == 0 {
            return Err(PaymentsError::validation(
                "event_id",
                "event is free; no payment intent is needed",
            ));
        }

        // 2. The host must have a verified connect account before any
        //    gateway call.
        let host = self
            .users
            .find_user(&event.created_by)
            .await?
            .ok_or_else(|| PaymentsError::not_found("user", event.created_by.to_string()))?;

        let connect = host
            .connect
            .as_ref()
            .filter(|c| c.can_accept_payments)
            .ok_or_else(|| PaymentsError::host_not_payable(host.id.clone()))?;

        // 3. Price the ticket. Rejects sub-minimum prices.
        let breakdown = self.calculator.ticket_breakdown(event.price)?;

        let metadata = IntentMetadata {
            kind: PaymentKind::Ticket,
            event_id: Some(cmd.event_id.clone()),
            user_id: cmd.user_id.clone(),
            host_id: host.id.clone(),
            breakdown: breakdown.clone(),
        };

        // 4. Destination charge: funds settle on the host's account, the
        //    application fee keeps both fees on the platform.
        let intent = self
            .gateway
            .create_payment_intent(CreateIntentRequest {
                amount_minor: breakdown.total_charged,
                currency: self.calculator.currency().to_string(),
                metadata: metadata.to_map(),
                transfer: Some(TransferSpec {
                    destination: connect.account_id.clone(),
                    application_fee: breakdown.platform_fee + breakdown.processor_fee,
                }),
            })
            .await?;

        tracing::info!(
            intent_id = %intent.id,
            event_id = %cmd.event_id,
            user_id = %cmd.user_id,
            total_charged = breakdown.total_charged,
            "Ticket payment intent created"
        );

        Ok(CreateTicketIntentResult { intent, breakdown })
    }
}
