//! Payment subsystem error taxonomy.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | HostNotPayable | 400 |
//! | AlreadyConnected | 409 |
//! | AmountBelowMinimum | 400 |
//! | SignatureInvalid | 400 |
//! | Gateway | 500 |
//!
//! None of these are retried internally; the request boundary maps them to a
//! structured JSON error and the caller decides whether to retry.

use super::fees::FeeError;
use super::ids::UserId;

/// Errors surfaced by the payment handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentsError {
    /// A request field is missing or malformed. Never reaches the gateway.
    Validation { field: String, message: String },

    /// The referenced event, user, or payment record does not exist.
    NotFound { resource: &'static str, id: String },

    /// The host lacks a verified connect account where one is required.
    /// Checked before any gateway call; no intent is created.
    HostNotPayable(UserId),

    /// The host already has a connect account; it is never silently replaced.
    AlreadyConnected(UserId),

    /// The amount is negative or below the configured minimum.
    AmountBelowMinimum { amount: i64, minimum: i64 },

    /// Webhook signature verification failed. The event is dropped; the
    /// gateway will retry delivery.
    SignatureInvalid(String),

    /// The external gateway or document-store call itself failed. No local
    /// state was mutated.
    Gateway(String),
}

impl PaymentsError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentsError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        PaymentsError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn host_not_payable(host_id: UserId) -> Self {
        PaymentsError::HostNotPayable(host_id)
    }

    pub fn already_connected(host_id: UserId) -> Self {
        PaymentsError::AlreadyConnected(host_id)
    }

    pub fn signature_invalid(message: impl Into<String>) -> Self {
        PaymentsError::SignatureInvalid(message.into())
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        PaymentsError::Gateway(message.into())
    }

    pub fn message(&self) -> String {
        match self {
            PaymentsError::Validation { field, message } => {
                format!("invalid {field}: {message}")
            }
            PaymentsError::NotFound { resource, id } => format!("{resource} {id} not found"),
            PaymentsError::HostNotPayable(host_id) => {
                format!("host {host_id} cannot accept payments yet")
            }
            PaymentsError::AlreadyConnected(host_id) => {
                format!("host {host_id} already has a connect account")
            }
            PaymentsError::AmountBelowMinimum { amount, minimum } => {
                format!("amount {amount} is below the minimum of {minimum}")
            }
            PaymentsError::SignatureInvalid(reason) => {
                format!("webhook signature verification failed: {reason}")
            }
            PaymentsError::Gateway(reason) => format!("payment gateway error: {reason}"),
        }
    }
}

impl std::fmt::Display for PaymentsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentsError {}

impl From<FeeError> for PaymentsError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::AmountBelowMinimum { amount, minimum } => {
                PaymentsError::AmountBelowMinimum { amount, minimum }
            }
            FeeError::InvalidRate(what) => {
                PaymentsError::validation("pricing", what)
            }
        }
    }
}
