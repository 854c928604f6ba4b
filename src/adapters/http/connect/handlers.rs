//! HTTP handlers for connect account endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{payments_error_response, ErrorResponse};
use crate::application::handlers::connect::{
    CreateAccountLinkCommand, CreateAccountLinkHandler, CreateConnectAccountCommand,
    CreateConnectAccountHandler, RefreshConnectStatusCommand, RefreshConnectStatusHandler,
};
use crate::domain::ids::UserId;

use super::dto::{
    AccountLinkResponse, AccountResponse, CreateAccountRequest, CreateAccountResponse,
    HostRequest, StatusResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ConnectHandlers {
    create_handler: Arc<CreateConnectAccountHandler>,
    link_handler: Arc<CreateAccountLinkHandler>,
    status_handler: Arc<RefreshConnectStatusHandler>,
}

impl ConnectHandlers {
    pub fn new(
        create_handler: Arc<CreateConnectAccountHandler>,
        link_handler: Arc<CreateAccountLinkHandler>,
        status_handler: Arc<RefreshConnectStatusHandler>,
    ) -> Self {
        Self {
            create_handler,
            link_handler,
            status_handler,
        }
    }
}

fn parse_user_id(raw: String) -> Result<UserId, Response> {
    UserId::new(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("user_id is required")),
        )
            .into_response()
    })
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/connect/accounts - Create a connect account
pub async fn create_account(
    State(handlers): State<ConnectHandlers>,
    Json(req): Json<CreateAccountRequest>,
) -> Response {
    let user_id = match parse_user_id(req.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = CreateConnectAccountCommand {
        user_id,
        email: req.email,
        full_name: req.full_name,
    };

    match handlers.create_handler.handle(cmd).await {
        Ok(result) => {
            let (onboarding_url, expires_at) = match result.onboarding {
                Some(link) => (Some(link.url), Some(link.expires_at)),
                None => (None, None),
            };
            let response = CreateAccountResponse {
                account: AccountResponse::from(&result.account),
                onboarding_url,
                expires_at,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => payments_error_response(e),
    }
}

/// POST /api/connect/account-link - Re-issue an onboarding link
pub async fn create_account_link(
    State(handlers): State<ConnectHandlers>,
    Json(req): Json<HostRequest>,
) -> Response {
    let user_id = match parse_user_id(req.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .link_handler
        .handle(CreateAccountLinkCommand { user_id })
        .await
    {
        Ok(link) => (StatusCode::OK, Json(AccountLinkResponse::from(link))).into_response(),
        Err(e) => payments_error_response(e),
    }
}

/// POST /api/connect/status - Reconcile and report account status
pub async fn refresh_status(
    State(handlers): State<ConnectHandlers>,
    Json(req): Json<HostRequest>,
) -> Response {
    let user_id = match parse_user_id(req.user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .status_handler
        .handle(RefreshConnectStatusCommand { user_id })
        .await
    {
        Ok(status) => {
            let response = StatusResponse {
                capability: status.capability,
                account: status.account.as_ref().map(AccountResponse::from),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => payments_error_response(e),
    }
}
