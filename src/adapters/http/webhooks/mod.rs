//! Stripe webhook HTTP endpoints, one per signing secret.

mod handlers;
mod routes;

pub use handlers::WebhookHandlers;
pub use routes::webhook_routes;
