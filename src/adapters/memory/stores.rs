//! In-memory document store adapters.
//!
//! Back the `UserStore`, `EventStore`, and `PaymentRecordStore` ports with
//! `tokio::sync::RwLock` maps. Used in tests and local development; the
//! idempotent write semantics (upsert-by-id, set-union, snapshot overwrite)
//! match what the production document database provides.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::connect::ConnectAccount;
use crate::domain::ids::{AccountId, EventId, IntentId, UserId};
use crate::domain::payment::PaymentRecord;
use crate::ports::{EventRecord, EventStore, PaymentRecordStore, StoreError, UserRecord, UserStore};

/// In-memory `users/{id}` collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user document (useful for tests).
    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_host_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.connect
                    .as_ref()
                    .is_some_and(|c| &c.account_id == account_id)
            })
            .cloned())
    }

    async fn save_connect_account(
        &self,
        user_id: &UserId,
        account: &ConnectAccount,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::new(format!("user {} not found", user_id)))?;

        user.connect = Some(account.clone());
        user.can_create_paid_events = account.can_accept_payments;
        Ok(())
    }
}

/// In-memory `events/{id}` collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<EventId, EventRecord>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event document (useful for tests).
    pub async fn insert(&self, event: EventRecord) {
        self.events.write().await.insert(event.id.clone(), event);
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn find_event(&self, event_id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn add_attendee(&self, event_id: &EventId, user_id: &UserId) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| StoreError::new(format!("event {} not found", event_id)))?;

        // Set-union: adding an existing attendee is a no-op.
        if !event.attendees.contains(user_id) {
            event.attendees.push(user_id.clone());
        }
        Ok(())
    }
}

/// In-memory `payments/{intent_id}` collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentRecordStore {
    records: Arc<RwLock<HashMap<IntentId, PaymentRecord>>>,
}

impl InMemoryPaymentRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PaymentRecordStore for InMemoryPaymentRecordStore {
    async fn upsert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.intent_id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_intent_id(
        &self,
        intent_id: &IntentId,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.records.read().await.get(intent_id).cloned())
    }

    async fn find_ticket_for_payer(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.event_id.as_ref() == Some(event_id) && &r.user_id == user_id)
            .cloned())
    }

    async fn record_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(intent_id)
            .ok_or_else(|| StoreError::new(format!("payment {} not found", intent_id)))?;

        record.refunded_amount += amount_minor;
        Ok(())
    }
}
