//! Adapters - implementations of the ports.
//!
//! - `stripe` - the real payment gateway, talking to the Stripe REST API
//! - `memory` - in-memory stores and notifier for tests and local runs
//! - `http` - the inbound REST surface

pub mod http;
pub mod memory;
pub mod stripe;

pub use memory::{
    InMemoryEventStore, InMemoryHostNotifier, InMemoryPaymentRecordStore, InMemoryUserStore,
};
pub use stripe::StripeGateway;
