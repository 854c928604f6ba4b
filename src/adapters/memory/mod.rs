//! In-memory adapters for the document store and notifier ports.

mod notifier;
mod stores;

pub use notifier::InMemoryHostNotifier;
pub use stores::{InMemoryEventStore, InMemoryPaymentRecordStore, InMemoryUserStore};
