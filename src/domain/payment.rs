//! Payment intent metadata and durable payment records.
//!
//! The fee breakdown computed at intent-creation time is embedded in the
//! gateway's opaque string-map metadata so it can be recovered later without
//! recomputation. The codec here is the single place that knows the key
//! names; both the issuer and the webhook reconciler go through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fees::FeeBreakdown;
use super::ids::{EventId, IntentId, UserId};

/// What kind of charge an intent represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Ticket,
    Tip,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Ticket => "ticket",
            PaymentKind::Tip => "tip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ticket" => Some(PaymentKind::Ticket),
            "tip" => Some(PaymentKind::Tip),
            _ => None,
        }
    }
}

/// Everything this system attaches to a gateway intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub kind: PaymentKind,
    pub event_id: Option<EventId>,
    pub user_id: UserId,
    pub host_id: UserId,
    pub breakdown: FeeBreakdown,
}

impl IntentMetadata {
    /// Encode into the gateway's flat string map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("type".to_string(), self.kind.as_str().to_string());
        if let Some(event_id) = &self.event_id {
            map.insert("event_id".to_string(), event_id.to_string());
        }
        map.insert("user_id".to_string(), self.user_id.to_string());
        map.insert("host_id".to_string(), self.host_id.to_string());
        map.insert("event_price".to_string(), self.breakdown.event_price.to_string());
        map.insert("platform_fee".to_string(), self.breakdown.platform_fee.to_string());
        map.insert("processor_fee".to_string(), self.breakdown.processor_fee.to_string());
        map.insert("total_charged".to_string(), self.breakdown.total_charged.to_string());
        map.insert("host_receives".to_string(), self.breakdown.host_receives.to_string());
        map.insert(
            "refundable_amount".to_string(),
            self.breakdown.refundable_amount.to_string(),
        );
        map
    }

    /// Decode from a gateway metadata map. Returns `None` when required keys
    /// are missing or malformed (legacy intents created before this codec).
    pub fn from_map(map: &BTreeMap<String, String>) -> Option<Self> {
        let kind = PaymentKind::parse(map.get("type")?)?;
        let amount = |key: &str| map.get(key).and_then(|v| v.parse::<i64>().ok());

        Some(Self {
            kind,
            event_id: map.get("event_id").cloned().and_then(|v| EventId::new(v).ok()),
            user_id: UserId::new(map.get("user_id")?.clone()).ok()?,
            host_id: UserId::new(map.get("host_id")?.clone()).ok()?,
            breakdown: FeeBreakdown {
                event_price: amount("event_price")?,
                platform_fee: amount("platform_fee")?,
                processor_fee: amount("processor_fee")?,
                total_charged: amount("total_charged")?,
                host_receives: amount("host_receives")?,
                refundable_amount: amount("refundable_amount")?,
            },
        })
    }
}

/// Gateway-side intent status we care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresConfirmation,
    Succeeded,
    Canceled,
    /// Any other gateway status; carried verbatim.
    Other(String),
}

impl IntentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "succeeded" => IntentStatus::Succeeded,
            "canceled" => IntentStatus::Canceled,
            other => IntentStatus::Other(other.to_string()),
        }
    }
}

/// A payment intent as seen by this system. Owned by the gateway; mirrored
/// read-only into the document store once reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: IntentId,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    pub client_secret: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntent {
    /// Decode the structured metadata this system attached at creation.
    pub fn decoded_metadata(&self) -> Option<IntentMetadata> {
        IntentMetadata::from_map(&self.metadata)
    }
}

/// Durable copy of a succeeded intent, keyed by the gateway's intent id so
/// webhook re-delivery is a no-op (upsert-by-id, not append).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub intent_id: IntentId,
    pub kind: PaymentKind,
    pub event_id: Option<EventId>,
    pub user_id: UserId,
    pub host_id: UserId,
    pub amount: i64,
    pub currency: String,
    pub breakdown: FeeBreakdown,

    /// Sum of refunds issued so far against this record.
    pub refunded_amount: i64,

    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Build the record for a succeeded intent from its decoded metadata.
    pub fn from_succeeded_intent(
        intent: &PaymentIntent,
        metadata: &IntentMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            intent_id: intent.id.clone(),
            kind: metadata.kind,
            event_id: metadata.event_id.clone(),
            user_id: metadata.user_id.clone(),
            host_id: metadata.host_id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            breakdown: metadata.breakdown.clone(),
            refunded_amount: 0,
            created_at: now,
        }
    }
}
