//! HTTP adapters - REST API implementations.
//!
//! Each payment area has its own HTTP adapter for endpoint exposure:
//! - `payments` - intent issuance and refunds under `/api/payments`
//! - `connect` - host onboarding under `/api/connect`
//! - `webhooks` - Stripe event ingestion under `/api/webhooks/stripe`

pub mod connect;
pub mod error;
pub mod payments;
pub mod webhooks;

// Re-export key types for convenience
pub use connect::ConnectHandlers;
pub use connect::connect_routes;
pub use payments::PaymentHandlers;
pub use payments::payment_routes;
pub use webhooks::WebhookHandlers;
pub use webhooks::webhook_routes;
