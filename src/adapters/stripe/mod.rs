//! Stripe adapter implementing the `PaymentGateway` port.

mod gateway;
mod types;

pub use gateway::StripeGateway;
