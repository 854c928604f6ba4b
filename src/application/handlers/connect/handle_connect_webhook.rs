//! HandleConnectWebhookHandler - the push half of connect reconciliation.
//!
//! `account.updated` identifies the host only by gateway account id; the
//! reverse lookup and the snapshot write are the whole job. Unknown accounts
//! are acknowledged and dropped so the gateway stops redelivering.

use std::sync::Arc;

use chrono::Utc;

use crate::application::handlers::WebhookOutcome;
use crate::domain::errors::PaymentsError;
use crate::ports::{GatewayEventKind, PaymentGateway, UserStore, WebhookChannel};

#[derive(Debug, Clone)]
pub struct HandleConnectWebhookCommand {
    pub payload: Vec<u8>,
    pub signature: String,
}

pub struct HandleConnectWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
}

impl HandleConnectWebhookHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, users: Arc<dyn UserStore>) -> Self {
        Self { gateway, users }
    }

    pub async fn handle(
        &self,
        cmd: HandleConnectWebhookCommand,
    ) -> Result<WebhookOutcome, PaymentsError> {
        let event = self
            .gateway
            .verify_webhook(WebhookChannel::Connect, &cmd.payload, &cmd.signature)
            .await?;

        let (account_id, snapshot) = match event.kind {
            GatewayEventKind::AccountUpdated {
                account_id,
                snapshot,
            } => (account_id, snapshot),
            GatewayEventKind::PaymentIntentSucceeded(_) => {
                return Ok(WebhookOutcome::Ignored {
                    reason: "payment event on connect channel".to_string(),
                })
            }
            GatewayEventKind::Other(kind) => {
                tracing::debug!(event_id = %event.id, kind = %kind, "Ignoring webhook event type");
                return Ok(WebhookOutcome::Ignored { reason: kind });
            }
        };

        let Some(host) = self.users.find_host_by_account_id(&account_id).await? else {
            tracing::warn!(
                account_id = %account_id,
                "account.updated for an account no user owns; skipping"
            );
            return Ok(WebhookOutcome::Ignored {
                reason: "unknown connect account".to_string(),
            });
        };

        // Same write as the poll path: recompute and overwrite.
        let mut account = host.connect.clone().ok_or_else(|| {
            PaymentsError::not_found("connect account", host.id.to_string())
        })?;
        account.apply_snapshot(snapshot, Utc::now());
        self.users.save_connect_account(&host.id, &account).await?;

        tracing::info!(
            account_id = %account_id,
            user_id = %host.id,
            can_accept_payments = account.can_accept_payments,
            "Connect account reconciled from webhook"
        );

        Ok(WebhookOutcome::Recorded { id: event.id })
    }
}
