//! ProcessRefundHandler - turns a ticket cancellation into a gateway refund.
//!
//! The refund base is recovered from the intent's own metadata when present;
//! charges that predate the metadata codec get a reconstructed breakdown
//! inverted from the charged total. Both paths are tagged on the result so
//! support can tell which arithmetic produced a payout.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::PaymentsError;
use crate::domain::fees::FeeCalculator;
use crate::domain::ids::{EventId, UserId};
use crate::domain::refund::{CancellationActor, RecoveredBreakdown, RefundPolicy};
use crate::ports::{EventStore, PaymentGateway, PaymentRecordStore, Refund};

/// Command to refund a payer's ticket on a cancelled attendance.
#[derive(Debug, Clone)]
pub struct ProcessRefundCommand {
    pub event_id: EventId,
    pub user_id: UserId,
    pub actor: CancellationActor,
}

/// Outcome of a refund computation, issued or not.
#[derive(Debug, Clone)]
pub struct ProcessRefundResult {
    /// Amount refunded in minor units; 0 means no gateway call was made.
    pub refund_amount: i64,

    /// The policy fraction applied.
    pub fraction: f64,

    /// The breakdown used and how it was obtained.
    pub recovered: RecoveredBreakdown,

    /// The gateway refund, when one was issued.
    pub refund: Option<Refund>,
}

pub struct ProcessRefundHandler {
    gateway: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventStore>,
    payments: Arc<dyn PaymentRecordStore>,
    calculator: FeeCalculator,
    policy: RefundPolicy,
}

impl ProcessRefundHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventStore>,
        payments: Arc<dyn PaymentRecordStore>,
        calculator: FeeCalculator,
        policy: RefundPolicy,
    ) -> Self {
        Self {
            gateway,
            events,
            payments,
            calculator,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessRefundCommand,
    ) -> Result<ProcessRefundResult, PaymentsError> {
        let event = self
            .events
            .find_event(&cmd.event_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("event", cmd.event_id.to_string()))?;

        let record = self
            .payments
            .find_ticket_for_payer(&cmd.event_id, &cmd.user_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("payment", cmd.user_id.to_string()))?;

        // The gateway's copy of the intent is the source of truth for what
        // was actually charged and what metadata it carries.
        let intent = self
            .gateway
            .retrieve_payment_intent(&record.intent_id)
            .await?
            .ok_or_else(|| {
                PaymentsError::not_found("payment intent", record.intent_id.to_string())
            })?;

        let recovered = RecoveredBreakdown::for_ticket(
            intent.decoded_metadata().map(|m| m.breakdown),
            intent.amount,
            &self.calculator,
        );

        let fraction = self
            .policy
            .refund_fraction(event.date, Utc::now(), cmd.actor);
        let refund_amount =
            self.policy
                .refund_amount(recovered.breakdown(), fraction, record.refunded_amount);

        if refund_amount == 0 {
            tracing::info!(
                intent_id = %record.intent_id,
                event_id = %cmd.event_id,
                user_id = %cmd.user_id,
                fraction,
                "Cancellation yields no refund"
            );
            return Ok(ProcessRefundResult {
                refund_amount: 0,
                fraction,
                recovered,
                refund: None,
            });
        }

        let refund = self
            .gateway
            .create_refund(&record.intent_id, refund_amount)
            .await?;
        self.payments
            .record_refund(&record.intent_id, refund_amount)
            .await?;

        tracing::info!(
            intent_id = %record.intent_id,
            refund_id = %refund.id,
            refund_amount,
            fraction,
            legacy = matches!(recovered, RecoveredBreakdown::LegacyReconstructed(_)),
            "Refund issued"
        );

        Ok(ProcessRefundResult {
            refund_amount,
            fraction,
            recovered,
            refund: Some(refund),
        })
    }
}
