//! Gatherly payments service binary.
//!
//! Wires the Stripe gateway and the in-memory stores into the application
//! handlers and serves the REST API. Swap the `memory` adapters for durable
//! ones when the platform's store implementations land here.

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gatherly_payments::adapters::http::{
    ConnectHandlers, PaymentHandlers, WebhookHandlers, connect_routes, payment_routes,
    webhook_routes,
};
use gatherly_payments::adapters::{
    InMemoryEventStore, InMemoryHostNotifier, InMemoryPaymentRecordStore, InMemoryUserStore,
    StripeGateway,
};
use gatherly_payments::application::handlers::connect::{
    CreateAccountLinkHandler, CreateConnectAccountHandler, HandleConnectWebhookHandler,
    OnboardingUrls, RefreshConnectStatusHandler,
};
use gatherly_payments::application::handlers::payments::{
    CreateTicketIntentHandler, CreateTipIntentHandler, HandlePaymentWebhookHandler,
    ProcessRefundHandler,
};
use gatherly_payments::config::AppConfig;
use gatherly_payments::domain::fees::FeeCalculator;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("gatherly-payments exited with error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config)?;
    info!(
        environment = ?config.server.environment,
        test_mode = config.gateway.is_test_mode(),
        "configuration loaded"
    );

    let app = build_app(&config);
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.server.log_level)?;
    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn build_app(config: &AppConfig) -> Router {
    let gateway = Arc::new(StripeGateway::new(&config.gateway));
    let users = Arc::new(InMemoryUserStore::new());
    let events = Arc::new(InMemoryEventStore::new());
    let payments = Arc::new(InMemoryPaymentRecordStore::new());
    let notifier = Arc::new(InMemoryHostNotifier::new());
    warn!("using in-memory stores; all payment records are lost on restart");

    let calculator = FeeCalculator::new(config.pricing.clone());
    let urls = OnboardingUrls {
        refresh_url: config.gateway.onboarding_refresh_url.clone(),
        return_url: config.gateway.onboarding_return_url.clone(),
    };

    let payment_handlers = PaymentHandlers::new(
        Arc::new(CreateTicketIntentHandler::new(
            gateway.clone(),
            users.clone(),
            events.clone(),
            calculator.clone(),
        )),
        Arc::new(CreateTipIntentHandler::new(
            gateway.clone(),
            users.clone(),
            calculator.clone(),
        )),
        Arc::new(ProcessRefundHandler::new(
            gateway.clone(),
            events.clone(),
            payments.clone(),
            calculator,
            config.refund.clone(),
        )),
    );

    let connect_handlers = ConnectHandlers::new(
        Arc::new(CreateConnectAccountHandler::new(
            gateway.clone(),
            users.clone(),
            urls.clone(),
        )),
        Arc::new(CreateAccountLinkHandler::new(
            gateway.clone(),
            users.clone(),
            urls,
        )),
        Arc::new(RefreshConnectStatusHandler::new(
            gateway.clone(),
            users.clone(),
        )),
    );

    let webhook_handlers = WebhookHandlers::new(
        Arc::new(HandlePaymentWebhookHandler::new(
            gateway.clone(),
            events,
            payments,
            notifier,
        )),
        Arc::new(HandleConnectWebhookHandler::new(gateway, users)),
    );

    Router::new()
        .route("/api/health-check", get(health_check))
        .nest("/api/payments", payment_routes(payment_handlers))
        .nest("/api/connect", connect_routes(connect_handlers))
        .nest("/api/webhooks/stripe", webhook_routes(webhook_handlers))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to install CTRL+C signal handler: {err}");
        return;
    }
    info!("received ctrl+C, shutting down");
}
