//! RefreshConnectStatusHandler - the poll half of connect reconciliation.
//!
//! Clients call this after the host returns from onboarding rather than
//! waiting for the `account.updated` webhook. Both paths write the same
//! recomputed snapshot, so their ordering is irrelevant.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::connect::{capability_of, ConnectAccount, ConnectCapability};
use crate::domain::errors::PaymentsError;
use crate::domain::ids::UserId;
use crate::ports::{PaymentGateway, UserStore};

#[derive(Debug, Clone)]
pub struct RefreshConnectStatusCommand {
    pub user_id: UserId,
}

/// The host's connect state after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectStatus {
    pub capability: ConnectCapability,
    pub account: Option<ConnectAccount>,
}

pub struct RefreshConnectStatusHandler {
    gateway: Arc<dyn PaymentGateway>,
    users: Arc<dyn UserStore>,
}

impl RefreshConnectStatusHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, users: Arc<dyn UserStore>) -> Self {
        Self { gateway, users }
    }

    pub async fn handle(
        &self,
        cmd: RefreshConnectStatusCommand,
    ) -> Result<ConnectStatus, PaymentsError> {
        let user = self
            .users
            .find_user(&cmd.user_id)
            .await?
            .ok_or_else(|| PaymentsError::not_found("user", cmd.user_id.to_string()))?;

        let Some(mut account) = user.connect else {
            return Ok(ConnectStatus {
                capability: ConnectCapability::NotConnected,
                account: None,
            });
        };

        let snapshot = self
            .gateway
            .retrieve_connect_account(&account.account_id)
            .await?;

        account.apply_snapshot(snapshot, Utc::now());
        self.users.save_connect_account(&user.id, &account).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            account_id = %account.account_id,
            can_accept_payments = account.can_accept_payments,
            "Connect status refreshed from gateway"
        );

        Ok(ConnectStatus {
            capability: capability_of(Some(&account)),
            account: Some(account),
        })
    }
}
