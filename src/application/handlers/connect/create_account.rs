//! CreateConnectAccountHandler - onboards a host onto the payment gateway.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::connect::ConnectAccount;
use crate::domain::errors::PaymentsError;
use crate::domain::ids::UserId;
use crate::ports::{AccountLink, CreateAccountRequest, PaymentGateway, UserStore};

/// Command to create a connect account for a host.
#[derive(Debug, Clone)]
pub struct CreateConnectAccountCommand {
    pub user_id: UserId,

    /// Overrides for the gateway account profile; the user record's values
    /// are used when absent.
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateConnectAccountResult {
    pub account: ConnectAccount,

    /// Onboarding link the host must complete before the account activates.
    /// `None` when link issuance failed after the account was created; the
    /// account-link endpoint re-issues one on demand.
    pub onboarding: Option<AccountLink>,
}

/// Where onboarding links send the host afterwards.
#[derive(Debug, Clone)]
pub struct OnboardingUrls {
    pub refresh_url: String,
    pub return_url: String,
}

/// Handler for creating a host's connect account.
///
/// An existing account is never replaced: the gateway id is the durable
/// identity the host verified themselves against, so a second creation
/// attempt is a conflict, not an upsert.
pub struct CreateConnectAccountHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
    urls: OnboardingUrls,
}

impl CreateConnectAccountHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        users: Arc<dyn UserStore>,
        urls: OnboardingUrls,
    ) -> Self {
        Self {
            gateway,
            users,
            urls,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateConnectAccountCommand,
    ) -> Result<CreateConnectAccountResult, PaymentsError> {
        let user = self
            .users
            .find_user(&cmd.user_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("user", cmd.user_id.to_string()))?;

        if user.connect.is_some() {
            return Err(PaymentsError::already_connected(user.id));
        }

        let account_id = self
            .gateway
            .create_connect_account(CreateAccountRequest {
                email: cmd.email.unwrap_or(user.email),
                full_name: cmd.full_name.or(user.full_name),
            })
            .await?;

        // The account starts unverified; reconciliation flips the booleans
        // once the host completes onboarding.
        let account = ConnectAccount::new(account_id.clone(), Utc::now());
        self.users.save_connect_account(&user.id, &account).await?;

        // The account is durably attached at this point. A link failure is
        // reported as a partial success, not an error: erroring here would
        // leave the client retrying into AlreadyConnected.
        let onboarding = match self
            .gateway
            .create_account_link(&account_id, &self.urls.refresh_url, &self.urls.return_url)
            .await
        {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!(
                    user_id = %cmd.user_id,
                    account_id = %account_id,
                    error = %e,
                    "Onboarding link issuance failed; account created, link must be re-requested"
                );
                None
            }
        };

        tracing::info!(
            user_id = %cmd.user_id,
            account_id = %account_id,
            link_issued = onboarding.is_some(),
            "Connect account created"
        );

        Ok(CreateConnectAccountResult {
            account,
            onboarding,
        })
    }
}
