//! Connect account lifecycle handlers: creation, onboarding links, and the
//! two reconciliation paths (poll and webhook).

mod create_account;
mod create_account_link;
mod handle_connect_webhook;
mod refresh_status;

pub use create_account::{
    CreateConnectAccountCommand, CreateConnectAccountHandler, CreateConnectAccountResult,
    OnboardingUrls,
};
pub use create_account_link::{CreateAccountLinkCommand, CreateAccountLinkHandler};
pub use handle_connect_webhook::{HandleConnectWebhookCommand, HandleConnectWebhookHandler};
pub use refresh_status::{ConnectStatus, RefreshConnectStatusCommand, RefreshConnectStatusHandler};
