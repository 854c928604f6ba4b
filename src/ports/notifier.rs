//! Host notification port.
//!
//! Notifications are best-effort and at-most-once: the webhook reconciler
//! logs a failure here and moves on. Attendance recording is the source of
//! truth, never the notification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ids::{EventId, UserId};
use crate::domain::payment::PaymentKind;

/// A payment-received notification for a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Locally minted id; this is the one id space we own.
    pub id: Uuid,

    pub host_id: UserId,
    pub payer_id: UserId,
    pub event_id: Option<EventId>,
    pub kind: PaymentKind,

    /// What the host receives, in minor units.
    pub amount_minor: i64,
}

impl PaymentNotification {
    pub fn new(
        host_id: UserId,
        payer_id: UserId,
        event_id: Option<EventId>,
        kind: PaymentKind,
        amount_minor: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            host_id,
            payer_id,
            event_id,
            kind,
            amount_minor,
        }
    }
}

/// Appends to the `notifications` collection.
#[async_trait]
pub trait HostNotifier: Send + Sync {
    async fn notify_payment_received(
        &self,
        notification: PaymentNotification,
    ) -> Result<(), NotifyError>;
}

/// Errors from notification delivery.
#[derive(Debug, Clone, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);
