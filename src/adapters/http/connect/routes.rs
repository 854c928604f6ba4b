//! HTTP routes for connect account endpoints.

use axum::{routing::post, Router};

use super::handlers::{create_account, create_account_link, refresh_status, ConnectHandlers};

/// Creates the connect router with all endpoints.
pub fn connect_routes(handlers: ConnectHandlers) -> Router {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/account-link", post(create_account_link))
        .route("/status", post(refresh_status))
        .with_state(handlers)
}
