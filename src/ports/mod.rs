//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentGateway` - the external payment gateway (Stripe)
//! - `UserStore` / `EventStore` / `PaymentRecordStore` - document store access
//! - `HostNotifier` - best-effort host notifications

mod document_store;
mod notifier;
mod payment_gateway;

pub use document_store::{EventRecord, EventStore, PaymentRecordStore, StoreError, UserRecord, UserStore};
pub use notifier::{HostNotifier, NotifyError, PaymentNotification};
pub use payment_gateway::{
    AccountLink, CreateAccountRequest, CreateIntentRequest, GatewayError, GatewayErrorCode,
    GatewayEvent, GatewayEventKind, PaymentGateway, Refund, TransferSpec, WebhookChannel,
};
