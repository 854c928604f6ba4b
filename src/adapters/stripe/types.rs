//! Stripe wire types for API responses and webhook payloads.
//!
//! These types represent Stripe objects exactly as they arrive on the wire
//! and are mapped to domain types at the adapter boundary. Nothing outside
//! `adapters/stripe` sees them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::connect::AccountSnapshot;
use crate::domain::ids::{AccountId, IntentId};
use crate::domain::payment::{IntentStatus, PaymentIntent};
use crate::ports::GatewayError;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v0=legacy_signature]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe generated the event.
    pub timestamp: i64,

    /// Primary v1 signature (HMAC-SHA256, hex-encoded).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore v0 and unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
        })
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Objects
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type, e.g. "payment_intent.succeeded".
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload.
    pub data: StripeEventData,

    /// Whether this event is from live mode.
    #[serde(default)]
    pub livemode: bool,
}

/// The `data` block of a webhook event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object the event describes; shape depends on the event type.
    pub object: serde_json::Value,
}

/// A payment intent as Stripe returns it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl StripePaymentIntent {
    /// Map to the domain intent type.
    pub fn into_domain(self) -> Result<PaymentIntent, GatewayError> {
        Ok(PaymentIntent {
            id: IntentId::new(self.id)
                .map_err(|e| GatewayError::provider(format!("bad intent id: {e}")))?,
            amount: self.amount,
            currency: self.currency,
            status: IntentStatus::parse(&self.status),
            client_secret: self.client_secret,
            metadata: self.metadata,
        })
    }
}

/// A connect account as Stripe returns it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeAccount {
    pub id: String,

    #[serde(default)]
    pub charges_enabled: bool,

    #[serde(default)]
    pub payouts_enabled: bool,

    #[serde(default)]
    pub details_submitted: bool,
}

impl StripeAccount {
    pub fn account_id(&self) -> Result<AccountId, GatewayError> {
        AccountId::new(self.id.clone())
            .map_err(|e| GatewayError::provider(format!("bad account id: {e}")))
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            charges_enabled: self.charges_enabled,
            payouts_enabled: self.payouts_enabled,
            details_submitted: self.details_submitted,
        }
    }
}

/// A refund as Stripe returns it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeRefund {
    pub id: String,
    pub amount: i64,
    pub status: String,
}

/// An account onboarding link as Stripe returns it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeAccountLink {
    pub url: String,
    pub expires_at: i64,
}
