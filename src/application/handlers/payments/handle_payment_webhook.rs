//! HandlePaymentWebhookHandler - reconciles `payment_intent.succeeded` events.
//!
//! The gateway retries delivery until it sees a 2xx, so every effect here is
//! idempotent: the payment record is an upsert keyed by intent id that
//! preserves the refund tally of an existing record, attendee addition is
//! set-union, and the notification is best-effort (logged and dropped on
//! failure, never retried) and sent only on first reconciliation.

use std::sync::Arc;

use crate::application::handlers::WebhookOutcome;
use crate::domain::errors::PaymentsError;
use crate::domain::payment::{PaymentKind, PaymentRecord};
use crate::ports::{
    EventStore, GatewayEventKind, HostNotifier, PaymentGateway, PaymentNotification,
    PaymentRecordStore, WebhookChannel,
};

/// A raw webhook delivery from the payments endpoint.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    pub payload: Vec<u8>,
    pub signature: String,
}

pub struct HandlePaymentWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventStore>,
    payments: Arc<dyn PaymentRecordStore>,
    notifier: Arc<dyn HostNotifier>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventStore>,
        payments: Arc<dyn PaymentRecordStore>,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        Self {
            gateway,
            events,
            payments,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<WebhookOutcome, PaymentsError> {
        // Signature first; nothing below runs on an unverified payload.
        let event = self
            .gateway
            .verify_webhook(WebhookChannel::Payments, &cmd.payload, &cmd.signature)
            .await?;

        let intent = match event.kind {
            GatewayEventKind::PaymentIntentSucceeded(intent) => intent,
            GatewayEventKind::AccountUpdated { .. } => {
                return Ok(WebhookOutcome::Ignored {
                    reason: "account event on payments channel".to_string(),
                })
            }
            GatewayEventKind::Other(kind) => {
                tracing::debug!(event_id = %event.id, kind = %kind, "Ignoring webhook event type");
                return Ok(WebhookOutcome::Ignored { reason: kind });
            }
        };

        // Intents without our metadata were not created by this subsystem
        // (or predate the codec). Acknowledge so the gateway stops retrying.
        let Some(metadata) = intent.decoded_metadata() else {
            tracing::warn!(
                intent_id = %intent.id,
                "Succeeded intent carries no recognizable metadata; skipping"
            );
            return Ok(WebhookOutcome::Ignored {
                reason: "unrecognized intent metadata".to_string(),
            });
        };

        // Only ticket payments are reconciled here; anything else is
        // acknowledged so the gateway stops retrying, and nothing is written.
        if metadata.kind != PaymentKind::Ticket {
            tracing::debug!(
                intent_id = %intent.id,
                kind = metadata.kind.as_str(),
                "Non-ticket payment succeeded; acknowledged without reconciliation"
            );
            return Ok(WebhookOutcome::Ignored {
                reason: "non-ticket payment".to_string(),
            });
        }

        // Re-delivery must not reset what a refund already recorded, so the
        // rebuilt record carries the existing tally (and original timestamp)
        // forward through the upsert.
        let existing = self.payments.find_by_intent_id(&intent.id).await?;
        let first_delivery = existing.is_none();

        let mut record = PaymentRecord::from_succeeded_intent(&intent, &metadata, chrono::Utc::now());
        if let Some(existing) = existing {
            record.refunded_amount = existing.refunded_amount;
            record.created_at = existing.created_at;
        }
        self.payments.upsert(&record).await?;

        // Attendance is granted only after the record is durably written.
        // Set-union, so a retry that failed here last time can make it up.
        if let Some(event_id) = &metadata.event_id {
            self.events.add_attendee(event_id, &metadata.user_id).await?;
            tracing::info!(
                intent_id = %intent.id,
                event_id = %event_id,
                user_id = %metadata.user_id,
                "Attendee recorded for paid event"
            );
        }

        // Best-effort, first delivery only: a failed notification never
        // fails the webhook, and a retried delivery never repeats one.
        if first_delivery {
            let notification = PaymentNotification::new(
                metadata.host_id.clone(),
                metadata.user_id.clone(),
                metadata.event_id.clone(),
                metadata.kind,
                metadata.breakdown.host_receives,
            );
            if let Err(e) = self.notifier.notify_payment_received(notification).await {
                tracing::warn!(
                    intent_id = %intent.id,
                    host_id = %metadata.host_id,
                    error = %e,
                    "Host notification failed; payment remains recorded"
                );
            }
        }

        Ok(WebhookOutcome::Recorded {
            id: intent.id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryEventStore, InMemoryHostNotifier, InMemoryPaymentRecordStore,
    };
    use crate::domain::connect::AccountSnapshot;
    use crate::domain::fees::{FeeCalculator, Pricing};
    use crate::domain::ids::{AccountId, EventId, IntentId, UserId};
    use crate::domain::payment::{IntentMetadata, IntentStatus, PaymentIntent};
    use crate::ports::{
        AccountLink, CreateAccountRequest, CreateIntentRequest, EventRecord, GatewayError,
        GatewayEvent, NotifyError, Refund,
    };
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    // Gateway whose verify_webhook returns a canned event.
    struct StubGateway {
        event: Option<GatewayEvent>,
    }

    impl StubGateway {
        fn delivering(event: GatewayEvent) -> Self {
            Self { event: Some(event) }
        }

        fn rejecting() -> Self {
            Self { event: None }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_payment_intent(
            &self,
            _request: CreateIntentRequest,
        ) -> Result<PaymentIntent, GatewayError> {
            Err(GatewayError::provider("Not implemented in stub"))
        }

        async fn retrieve_payment_intent(
            &self,
            _intent_id: &IntentId,
        ) -> Result<Option<PaymentIntent>, GatewayError> {
            Ok(None)
        }

        async fn create_refund(
            &self,
            _intent_id: &IntentId,
            _amount_minor: i64,
        ) -> Result<Refund, GatewayError> {
            Err(GatewayError::provider("Not implemented in stub"))
        }

        async fn create_connect_account(
            &self,
            _request: CreateAccountRequest,
        ) -> Result<AccountId, GatewayError> {
            Err(GatewayError::provider("Not implemented in stub"))
        }

        async fn create_account_link(
            &self,
            _account_id: &AccountId,
            _refresh_url: &str,
            _return_url: &str,
        ) -> Result<AccountLink, GatewayError> {
            Err(GatewayError::provider("Not implemented in stub"))
        }

        async fn retrieve_connect_account(
            &self,
            _account_id: &AccountId,
        ) -> Result<AccountSnapshot, GatewayError> {
            Err(GatewayError::provider("Not implemented in stub"))
        }

        async fn verify_webhook(
            &self,
            _channel: WebhookChannel,
            _payload: &[u8],
            _signature: &str,
        ) -> Result<GatewayEvent, GatewayError> {
            self.event
                .clone()
                .ok_or_else(|| GatewayError::invalid_webhook("Invalid signature"))
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl HostNotifier for FailingNotifier {
        async fn notify_payment_received(
            &self,
            _notification: PaymentNotification,
        ) -> Result<(), NotifyError> {
            Err(NotifyError("delivery channel down".to_string()))
        }
    }

    fn ticket_metadata() -> IntentMetadata {
        let breakdown = FeeCalculator::new(Pricing {
            platform_fee_rate: 0.05,
            processor_fee_rate: 0.029,
            processor_fixed_fee: 300,
            currency: "usd".to_string(),
            min_ticket_price: 100,
            min_tip: 100,
        })
        .ticket_breakdown(50_000)
        .unwrap();

        IntentMetadata {
            kind: PaymentKind::Ticket,
            event_id: Some(EventId::new("ev_1").unwrap()),
            user_id: UserId::new("u_1").unwrap(),
            host_id: UserId::new("host_1").unwrap(),
            breakdown,
        }
    }

    fn succeeded_event(metadata: Option<&IntentMetadata>) -> GatewayEvent {
        let map = metadata.map(|m| m.to_map()).unwrap_or_default();
        let amount = metadata.map(|m| m.breakdown.total_charged).unwrap_or(54_250);
        GatewayEvent {
            id: "evt_1".to_string(),
            created_at: Utc::now().timestamp(),
            kind: GatewayEventKind::PaymentIntentSucceeded(PaymentIntent {
                id: IntentId::new("pi_1").unwrap(),
                amount,
                currency: "usd".to_string(),
                status: IntentStatus::Succeeded,
                client_secret: None,
                metadata: map,
            }),
        }
    }

    async fn seeded_event_store() -> Arc<InMemoryEventStore> {
        let store = Arc::new(InMemoryEventStore::new());
        store
            .insert(EventRecord {
                id: EventId::new("ev_1").unwrap(),
                price: 50_000,
                date: Utc::now() + Duration::days(10),
                created_by: UserId::new("host_1").unwrap(),
                attendees: vec![],
            })
            .await;
        store
    }

    fn command() -> HandlePaymentWebhookCommand {
        HandlePaymentWebhookCommand {
            payload: b"{}".to_vec(),
            signature: "t=1,v1=aa".to_string(),
        }
    }

    #[tokio::test]
    async fn records_payment_and_grants_attendance() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let events = seeded_event_store().await;
        let payments = Arc::new(InMemoryPaymentRecordStore::new());
        let notifier = Arc::new(InMemoryHostNotifier::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            events.clone(),
            payments.clone(),
            notifier.clone(),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Recorded {
                id: "pi_1".to_string()
            }
        );

        let record = payments
            .find_by_intent_id(&IntentId::new("pi_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.amount, 54_250);
        assert_eq!(record.kind, PaymentKind::Ticket);

        let event = events
            .find_event(&EventId::new("ev_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.attendees, vec![UserId::new("u_1").unwrap()]);
    }

    #[tokio::test]
    async fn redelivery_is_idempotent() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let events = seeded_event_store().await;
        let payments = Arc::new(InMemoryPaymentRecordStore::new());
        let notifier = Arc::new(InMemoryHostNotifier::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            events.clone(),
            payments.clone(),
            notifier,
        );

        handler.handle(command()).await.unwrap();
        handler.handle(command()).await.unwrap();

        assert_eq!(payments.count().await, 1);
        let event = events
            .find_event(&EventId::new("ev_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.attendees.len(), 1);
    }

    #[tokio::test]
    async fn redelivery_preserves_refund_tally() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let payments = Arc::new(InMemoryPaymentRecordStore::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            payments.clone(),
            Arc::new(InMemoryHostNotifier::new()),
        );

        handler.handle(command()).await.unwrap();

        // The attendee cancels and is fully refunded before the gateway
        // retires its retry schedule for the original delivery.
        payments
            .record_refund(&IntentId::new("pi_1").unwrap(), 50_000)
            .await
            .unwrap();

        handler.handle(command()).await.unwrap();

        let record = payments
            .find_by_intent_id(&IntentId::new("pi_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.refunded_amount, 50_000);
    }

    #[tokio::test]
    async fn redelivery_does_not_repeat_the_notification() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let notifier = Arc::new(InMemoryHostNotifier::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            Arc::new(InMemoryPaymentRecordStore::new()),
            notifier.clone(),
        );

        handler.handle(command()).await.unwrap();
        handler.handle(command()).await.unwrap();

        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn notifies_host_with_their_share() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let notifier = Arc::new(InMemoryHostNotifier::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            Arc::new(InMemoryPaymentRecordStore::new()),
            notifier.clone(),
        );

        handler.handle(command()).await.unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].host_id.as_str(), "host_1");
        // Host is notified of their share, not the gross charge.
        assert_eq!(sent[0].amount_minor, 50_000);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_webhook() {
        let metadata = ticket_metadata();
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let payments = Arc::new(InMemoryPaymentRecordStore::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            payments.clone(),
            Arc::new(FailingNotifier),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Recorded { .. }));
        assert_eq!(payments.count().await, 1);
    }

    #[tokio::test]
    async fn ignores_intents_without_metadata() {
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(None)));
        let payments = Arc::new(InMemoryPaymentRecordStore::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            payments.clone(),
            Arc::new(InMemoryHostNotifier::new()),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));
        assert_eq!(payments.count().await, 0);
    }

    #[tokio::test]
    async fn ignores_unrelated_event_types() {
        let gateway = Arc::new(StubGateway::delivering(GatewayEvent {
            id: "evt_x".to_string(),
            created_at: Utc::now().timestamp(),
            kind: GatewayEventKind::Other("charge.refunded".to_string()),
        }));

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            seeded_event_store().await,
            Arc::new(InMemoryPaymentRecordStore::new()),
            Arc::new(InMemoryHostNotifier::new()),
        );

        let outcome = handler.handle(command()).await.unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                reason: "charge.refunded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn rejects_invalid_signature() {
        let handler = HandlePaymentWebhookHandler::new(
            Arc::new(StubGateway::rejecting()),
            seeded_event_store().await,
            Arc::new(InMemoryPaymentRecordStore::new()),
            Arc::new(InMemoryHostNotifier::new()),
        );

        let result = handler.handle(command()).await;
        assert!(matches!(result, Err(PaymentsError::SignatureInvalid(_))));
    }

    #[tokio::test]
    async fn tip_events_are_acknowledged_and_ignored() {
        let mut metadata = ticket_metadata();
        metadata.kind = PaymentKind::Tip;
        metadata.event_id = None;
        let gateway = Arc::new(StubGateway::delivering(succeeded_event(Some(&metadata))));
        let events = seeded_event_store().await;
        let payments = Arc::new(InMemoryPaymentRecordStore::new());
        let notifier = Arc::new(InMemoryHostNotifier::new());

        let handler = HandlePaymentWebhookHandler::new(
            gateway,
            events.clone(),
            payments.clone(),
            notifier.clone(),
        );

        let outcome = handler.handle(command()).await.unwrap();

        // Terminal: nothing written, nothing sent, gateway stops retrying.
        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));
        assert_eq!(payments.count().await, 0);
        assert!(notifier.sent().await.is_empty());

        let event = events
            .find_event(&EventId::new("ev_1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(event.attendees.is_empty());
    }
}
