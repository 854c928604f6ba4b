//! Payment gateway port for external payment processing.
//!
//! Defines the contract for the payment gateway integration (Stripe in
//! production). Implementations handle intent creation, refunds, connect
//! account management, and webhook signature verification.
//!
//! # Design
//!
//! - **Gateway agnostic**: the interface carries no Stripe wire types
//! - **No internal retries**: callers tolerate re-invocation with the same
//!   idempotency key instead; this subsystem never retries writes
//! - **Check-before-call**: handlers validate host payability before any
//!   method here is invoked

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::connect::AccountSnapshot;
use crate::domain::errors::PaymentsError;
use crate::domain::ids::{AccountId, IntentId};
use crate::domain::payment::PaymentIntent;

/// Port for the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment authorization for `amount_minor` of `currency`.
    ///
    /// The metadata map is stored opaquely on the intent and returned
    /// verbatim in webhooks. When `transfer` is set, the gateway routes
    /// `transfer.application_fee` to the platform and the remainder to the
    /// host's connect account.
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Retrieve an intent by id. `None` if the gateway does not know it.
    async fn retrieve_payment_intent(
        &self,
        intent_id: &IntentId,
    ) -> Result<Option<PaymentIntent>, GatewayError>;

    /// Refund part of a succeeded intent.
    async fn create_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
    ) -> Result<Refund, GatewayError>;

    /// Create a connect sub-account for a host.
    async fn create_connect_account(
        &self,
        request: CreateAccountRequest,
    ) -> Result<AccountId, GatewayError>;

    /// Create an onboarding link for an existing connect account.
    async fn create_account_link(
        &self,
        account_id: &AccountId,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, GatewayError>;

    /// Pull the current verification booleans for a connect account.
    async fn retrieve_connect_account(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountSnapshot, GatewayError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Each delivery channel has its own signing secret. Returns the parsed
    /// event if the signature is valid; the event must be dropped (4xx)
    /// otherwise - the gateway retries delivery on its own.
    async fn verify_webhook(
        &self,
        channel: WebhookChannel,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, GatewayError>;
}

/// Which webhook endpoint a delivery arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookChannel {
    /// Payment events (`payment_intent.succeeded`, ...).
    Payments,

    /// Connect account events (`account.updated`, ...).
    Connect,
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount to charge the payer, in minor units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Opaque metadata stored on the intent.
    pub metadata: BTreeMap<String, String>,

    /// Destination-charge routing; absent for charges kept entirely by the
    /// platform (never the case for tickets or tips today).
    pub transfer: Option<TransferSpec>,
}

/// Routing of a charge to a host's connect account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSpec {
    /// The host's connect account receiving the remainder.
    pub destination: AccountId,

    /// Fee kept by the platform, in minor units.
    pub application_fee: i64,
}

/// A refund issued at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Gateway refund id (`re_...`).
    pub id: String,

    /// Refunded amount in minor units.
    pub amount_minor: i64,

    /// Gateway-reported status (`succeeded`, `pending`, ...).
    pub status: String,
}

/// Request to create a connect sub-account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub full_name: Option<String>,
}

/// Onboarding link for a connect account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLink {
    pub url: String,

    /// Unix timestamp when the link expires.
    pub expires_at: i64,
}

/// A verified webhook event from the gateway.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    /// Event id from the gateway (`evt_...`).
    pub id: String,

    /// When the event occurred (Unix timestamp).
    pub created_at: i64,

    pub kind: GatewayEventKind,
}

/// The webhook deliveries this subsystem consumes.
#[derive(Debug, Clone)]
pub enum GatewayEventKind {
    /// A payment intent succeeded; carries the full intent including our
    /// metadata.
    PaymentIntentSucceeded(PaymentIntent),

    /// A connect account's verification state changed.
    AccountUpdated {
        account_id: AccountId,
        snapshot: AccountSnapshot,
    },

    /// Anything else; acknowledged and ignored.
    Other(String),
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,

    /// Whether the caller may safely retry with the same idempotency key.
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Provider, message)
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidWebhook, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{resource} not found"))
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for PaymentsError {
    fn from(err: GatewayError) -> Self {
        match err.code {
            GatewayErrorCode::InvalidWebhook => PaymentsError::signature_invalid(err.message),
            _ => PaymentsError::gateway(err.message),
        }
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    Network,

    /// Gateway rejected or failed the call.
    Provider,

    /// Resource not found at the gateway.
    NotFound,

    /// Webhook signature or payload failed verification.
    InvalidWebhook,

    /// Rate limit exceeded.
    RateLimited,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::Network | GatewayErrorCode::RateLimited)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network",
            GatewayErrorCode::Provider => "provider",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidWebhook => "invalid_webhook",
            GatewayErrorCode::RateLimited => "rate_limited",
        };
        write!(f, "{s}")
    }
}
