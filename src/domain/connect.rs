//! Connect account state - a host's sub-account at the payment gateway.
//!
//! The gateway reports three independent booleans for an account. Whether the
//! host can accept payments is always recomputed from those booleans, never
//! stored as an independent flag, so the two reconciliation paths (status
//! poll and `account.updated` webhook) can race freely: whichever write lands
//! last simply reflects the gateway's last-known truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::AccountId;

/// The three booleans the gateway reports for a connect account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
}

impl AccountSnapshot {
    /// Derived payment capability. A pure function of the three booleans.
    pub fn can_accept_payments(&self) -> bool {
        self.charges_enabled && self.payouts_enabled && self.details_submitted
    }
}

/// A host's connect account as mirrored on their user record.
///
/// Created once (the id is assigned by the gateway and never replaced); only
/// the snapshot booleans and the timestamp are ever updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectAccount {
    pub account_id: AccountId,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,

    /// Derived: `charges_enabled && payouts_enabled && details_submitted`.
    /// Recomputed on every write.
    pub can_accept_payments: bool,

    /// When the snapshot was last written. Resolves which of two concurrent
    /// writers (poll vs webhook) is newest when inspecting records.
    pub updated_at: DateTime<Utc>,
}

impl ConnectAccount {
    /// A freshly created account: id assigned, nothing verified yet.
    pub fn new(account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            charges_enabled: false,
            payouts_enabled: false,
            details_submitted: false,
            can_accept_payments: false,
            updated_at: now,
        }
    }

    /// Write a gateway-reported snapshot, recomputing the derived field.
    ///
    /// Both the poll path and the webhook path call this and nothing else, so
    /// out-of-order delivery between them is harmless.
    pub fn apply_snapshot(&mut self, snapshot: AccountSnapshot, now: DateTime<Utc>) {
        self.charges_enabled = snapshot.charges_enabled;
        self.payouts_enabled = snapshot.payouts_enabled;
        self.details_submitted = snapshot.details_submitted;
        self.can_accept_payments = snapshot.can_accept_payments();
        self.updated_at = now;
    }

    pub fn capability(&self) -> ConnectCapability {
        if self.can_accept_payments {
            ConnectCapability::Active
        } else {
            ConnectCapability::Pending
        }
    }
}

/// Tri-state capability exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectCapability {
    /// The host has no connect account yet.
    NotConnected,

    /// An account exists but onboarding or verification is incomplete.
    Pending,

    /// All three gateway booleans are true; the host can accept payments.
    Active,
}

/// Capability for an optional account, covering the not-connected case.
pub fn capability_of(account: Option<&ConnectAccount>) -> ConnectCapability {
    match account {
        None => ConnectCapability::NotConnected,
        Some(acct) => acct.capability(),
    }
}
