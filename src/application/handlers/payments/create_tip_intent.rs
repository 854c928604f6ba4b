//! CreateTipIntentHandler - issues a payment intent for a host tip.

use std::sync::Arc;

use crate::domain::errors::PaymentsError;
use crate::domain::fees::{FeeBreakdown, FeeCalculator};
use crate::domain::ids::{EventId, UserId};
use crate::domain::payment::{IntentMetadata, PaymentIntent, PaymentKind};
use crate::ports::{CreateIntentRequest, PaymentGateway, TransferSpec, UserStore};

/// Command to tip a host directly.
#[derive(Debug, Clone)]
pub struct CreateTipIntentCommand {
    pub host_id: UserId,
    pub user_id: UserId,

    /// Tip amount in minor units; the payer is charged exactly this.
    pub amount: i64,

    /// The event that prompted the tip, when there is one.
    pub event_id: Option<EventId>,

    /// Free-text note from the payer, carried on the intent for the host.
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTipIntentResult {
    pub intent: PaymentIntent,
    pub breakdown: FeeBreakdown,
}

/// Handler for issuing tip payment intents.
///
/// Tips carry no platform fee and may optionally reference an event. The payer
/// is charged exactly the tip; the processor's cut comes out of what the host
/// receives and is recorded in the breakdown for audit.
pub struct CreateTipIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
    calculator: FeeCalculator,
}

impl CreateTipIntentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        users: Arc<dyn UserStore>,
        calculator: FeeCalculator,
    ) -> Self {
        Self {
            gateway,
            users,
            calculator,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateTipIntentCommand,
    ) -> Result<CreateTipIntentResult, PaymentsError> {
        let host = self
            .users
            .find_user(&cmd.host_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("user", cmd.host_id.to_string()))?;

        let connect = host
            .connect
            .as_ref()
            .filter(|c| c.can_accept_payments)
            .ok_or_else(|| PaymentsError::host_not_payable(host.id.clone()))?;

        let breakdown = self.calculator.tip_breakdown(cmd.amount)?;

        let metadata = IntentMetadata {
            kind: PaymentKind::Tip,
            event_id: cmd.event_id.clone(),
            user_id: cmd.user_id.clone(),
            host_id: host.id.clone(),
            breakdown: breakdown.clone(),
        };

        // The message rides on the intent as an extra metadata key; the
        // decoder ignores keys it does not know.
        let mut metadata_map = metadata.to_map();
        if let Some(message) = cmd.message.as_ref().filter(|m| !m.trim().is_empty()) {
            metadata_map.insert("message".to_string(), message.trim().to_string());
        }

        // No application fee on tips; the platform takes nothing.
        let intent = self
            .gateway
            .create_payment_intent(CreateIntentRequest {
                amount_minor: breakdown.total_charged,
                currency: self.calculator.currency().to_string(),
                metadata: metadata_map,
                transfer: Some(TransferSpec {
                    destination: connect.account_id.clone(),
                    application_fee: 0,
                }),
            })
            .await?;

        tracing::info!(
            intent_id = %intent.id,
            host_id = %cmd.host_id,
            user_id = %cmd.user_id,
            amount = cmd.amount,
            "Tip payment intent created"
        );

        Ok(CreateTipIntentResult { intent, breakdown })
    }
}
