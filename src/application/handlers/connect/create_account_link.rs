//! CreateAccountLinkHandler - issues a fresh onboarding link.
//!
//! Onboarding links are single-use and expire quickly; hosts who abandon the
//! flow come back through here for a new one.

use std::sync::Arc;

use crate::domain::errors::PaymentsError;
use crate::domain::ids::UserId;
use crate::ports::{AccountLink, PaymentGateway, UserStore};

use super::create_account::OnboardingUrls;

#[derive(Debug, Clone)]
pub struct CreateAccountLinkCommand {
    pub user_id: UserId,
}

pub struct CreateAccountLinkHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
    urls: OnboardingUrls,
}

impl CreateAccountLinkHandler {
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
        cmd: CreateAccountLinkCommand,
    ) -> Result<AccountLink, PaymentsError> {
        let user = self
            .users
            .find_user(&cmd.user_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("user", cmd.user_id.to_string()))?;

        let connect = user
            .connect
            .as_ref()
            .ok_or_else(|| PaymentsError::not_found("connect account", cmd.user_id.to_string()))?;

        let link = self
            .gateway
            .create_account_link(
                &connect.account_id,
                &self.urls.refresh_url,
                &self.urls.return_url,
            )
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            account_id = %connect.account_id,
            "Onboarding link re-issued"
        );

        Ok(link)
    }
}
