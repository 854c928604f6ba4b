//! In-memory host notifier.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{HostNotifier, NotifyError, PaymentNotification};

/// Appends notifications to an in-memory list.
///
/// Production appends to the `notifications` collection; this adapter records
/// deliveries so tests can assert on them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHostNotifier {
    sent: Arc<RwLock<Vec<PaymentNotification>>>,
}

impl InMemoryHostNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<PaymentNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl HostNotifier for InMemoryHostNotifier {
    async fn notify_payment_received(
        &self,
        notification: PaymentNotification,
    ) -> Result<(), NotifyError> {
        self.sent.write().await.push(notification);
        Ok(())
    }
}
