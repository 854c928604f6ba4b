//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `ids` - Strongly-typed identifier value objects
//! - `fees` - Fee calculator: charge splits for tickets and tips
//! - `refund` - Refund policy engine and breakdown recovery
//! - `connect` - Host connect-account state and derived capability
//! - `payment` - Intent metadata codec and durable payment records
//! - `errors` - Subsystem error taxonomy

pub mod connect;
pub mod errors;
pub mod fees;
pub mod ids;
pub mod payment;
pub mod refund;
