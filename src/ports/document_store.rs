//! Document store ports.
//!
//! The document database itself is an external collaborator; these traits are
//! the only contracts this subsystem has with it. All writes are idempotent
//! by construction (upsert-by-id, set-union, snapshot recomputation) so
//! concurrent duplicate invocations need no locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::connect::ConnectAccount;
use crate::domain::errors::PaymentsError;
use crate::domain::ids::{AccountId, EventId, IntentId, UserId};
use crate::domain::payment::PaymentRecord;

/// A user document, as far as payments is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,

    /// The `stripe_connect` block on the user document. Absent until the
    /// host creates an account.
    pub connect: Option<ConnectAccount>,

    /// The `host_config.can_create_paid_events` flag; mirrors the connect
    /// account's derived capability on every snapshot write.
    pub can_create_paid_events: bool,
}

/// An event document, as far as payments is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub price: i64,
    pub date: DateTime<Utc>,
    pub created_by: UserId,
    pub attendees: Vec<UserId>,
}

/// Read/write access to `users/{id}`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Reverse lookup used by the connect webhook, which identifies the host
    /// only by the gateway-assigned account id.
    async fn find_host_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Write the host's connect block and the mirrored
    /// `can_create_paid_events` flag. An idempotent snapshot write - both the
    /// poll and webhook reconciliation paths call this with recomputed state.
    async fn save_connect_account(
        &self,
        user_id: &UserId,
        account: &ConnectAccount,
    ) -> Result<(), StoreError>;
}

/// Read/write access to `events/{id}`.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, event_id: &EventId) -> Result<Option<EventRecord>, StoreError>;

    /// Add a payer to the attendee set. Set-union semantics: repeated
    /// addition of the same user is a no-op.
    async fn add_attendee(&self, event_id: &EventId, user_id: &UserId) -> Result<(), StoreError>;
}

/// Read/write access to `payments/{intent_id}`.
#[async_trait]
pub trait PaymentRecordStore: Send + Sync {
    /// Upsert keyed by intent id. Re-delivery of the same webhook performs
    /// the same upsert and produces no duplicate record.
    async fn upsert(&self, record: &PaymentRecord) -> Result<(), StoreError>;

    async fn find_by_intent_id(
        &self,
        intent_id: &IntentId,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// The ticket record for a payer on an event, if one was reconciled.
    async fn find_ticket_for_payer(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Record an issued refund by adding to the record's refunded total.
    async fn record_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
    ) -> Result<(), StoreError>;
}

/// Errors from document store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("document store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<StoreError> for PaymentsError {
    fn from(err: StoreError) -> Self {
        PaymentsError::gateway(err.0)
    }
}
