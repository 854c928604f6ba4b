//! HTTP DTOs for connect account endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::connect::{ConnectAccount, ConnectCapability};
use crate::ports::AccountLink;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a connect account for a host.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub user_id: String,

    /// Optional overrides; the user record's profile is used when absent.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Request naming the host for link issuance or a status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRequest {
    pub user_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A host's connect account as exposed to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub can_accept_payments: bool,
}

impl From<&ConnectAccount> for AccountResponse {
    fn from(account: &ConnectAccount) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            charges_enabled: account.charges_enabled,
            payouts_enabled: account.payouts_enabled,
            details_submitted: account.details_submitted,
            can_accept_payments: account.can_accept_payments,
        }
    }
}

/// Response for account creation: the pending account plus its onboarding
/// link. The link fields are null when issuance failed after the account was
/// created; clients re-request one via the account-link endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAccountResponse {
    pub account: AccountResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Response for a re-issued onboarding link.
#[derive(Debug, Clone, Serialize)]
pub struct AccountLinkResponse {
    pub url: String,
    pub expires_at: i64,
}

impl From<AccountLink> for AccountLinkResponse {
    fn from(link: AccountLink) -> Self {
        Self {
            url: link.url,
            expires_at: link.expires_at,
        }
    }
}

/// Response for a status poll.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub capability: ConnectCapability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountResponse>,
}
