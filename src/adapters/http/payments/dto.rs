//! HTTP DTOs for payment endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent
//! evolution.

use serde::{Deserialize, Serialize};

use crate::domain::fees::FeeBreakdown;
use crate::domain::payment::PaymentIntent;
use crate::domain::refund::{CancellationActor, RecoveredBreakdown};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to start a ticket purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct EventIntentRequest {
    pub event_id: String,
    pub user_id: String,
}

/// Request to tip a host.
#[derive(Debug, Clone, Deserialize)]
pub struct TipIntentRequest {
    pub host_id: String,
    pub user_id: String,

    /// Tip amount in minor units.
    pub amount: i64,

    /// The event that prompted the tip, if any.
    #[serde(default)]
    pub event_id: Option<String>,

    /// Optional note shown to the host.
    #[serde(default)]
    pub message: Option<String>,
}

/// Request to refund a cancelled ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    pub event_id: String,
    pub user_id: String,
    pub actor: CancellationActor,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Fee breakdown exposed to the paying client.
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownResponse {
    pub event_price: i64,
    pub platform_fee: i64,
    pub processor_fee: i64,
    pub total_charged: i64,
    pub host_receives: i64,
    pub refundable_amount: i64,
}

impl From<&FeeBreakdown> for BreakdownResponse {
    fn from(b: &FeeBreakdown) -> Self {
        Self {
            event_price: b.event_price,
            platform_fee: b.platform_fee,
            processor_fee: b.processor_fee,
            total_charged: b.total_charged,
            host_receives: b.host_receives,
            refundable_amount: b.refundable_amount,
        }
    }
}

/// Response for successful intent creation.
#[derive(Debug, Clone, Serialize)]
pub struct IntentResponse {
    pub intent_id: String,

    /// Handed to the client SDK to confirm the payment.
    pub client_secret: Option<String>,

    pub amount: i64,
    pub currency: String,
    pub breakdown: BreakdownResponse,
}

impl IntentResponse {
    pub fn from_parts(intent: &PaymentIntent, breakdown: &FeeBreakdown) -> Self {
        Self {
            intent_id: intent.id.to_string(),
            client_secret: intent.client_secret.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            breakdown: breakdown.into(),
        }
    }
}

/// Response for a processed refund request.
#[derive(Debug, Clone, Serialize)]
pub struct RefundResponse {
    /// Amount refunded in minor units; 0 when policy yields nothing.
    pub refund_amount: i64,

    pub fraction: f64,

    /// `metadata` or `legacy_reconstructed`.
    pub breakdown_source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
}

impl RefundResponse {
    pub fn source_of(recovered: &RecoveredBreakdown) -> &'static str {
        match recovered {
            RecoveredBreakdown::Metadata(_) => "metadata",
            RecoveredBreakdown::LegacyReconstructed(_) => "legacy_reconstructed",
        }
    }
}

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub status: String,
}

impl WebhookAck {
    pub fn recorded() -> Self {
        Self {
            received: true,
            status: "recorded".to_string(),
        }
    }

    pub fn ignored() -> Self {
        Self {
            received: true,
            status: "ignored".to_string(),
        }
    }
}
