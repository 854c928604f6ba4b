//! Connect account HTTP endpoints: onboarding and status reconciliation.

mod dto;
mod handlers;
mod routes;

pub use handlers::ConnectHandlers;
pub use routes::connect_routes;
