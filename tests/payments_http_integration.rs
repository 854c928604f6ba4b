//! Integration tests for the payments HTTP surface.
//!
//! These tests drive the full router the way a client would:
//! 1. Requests hit the real routes, extractors, and DTOs
//! 2. Application handlers run against in-memory stores
//! 3. Only the payment gateway is mocked, at the port boundary

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use gatherly_payments::adapters::http::{
    ConnectHandlers, PaymentHandlers, WebhookHandlers, connect_routes, payment_routes,
    webhook_routes,
};
use gatherly_payments::adapters::{
    InMemoryEventStore, InMemoryHostNotifier, InMemoryPaymentRecordStore, InMemoryUserStore,
};
use gatherly_payments::application::handlers::connect::{
    CreateAccountLinkHandler, CreateConnectAccountHandler, HandleConnectWebhookHandler,
    OnboardingUrls, RefreshConnectStatusHandler,
};
use gatherly_payments::application::handlers::payments::{
    CreateTicketIntentHandler, CreateTipIntentHandler, HandlePaymentWebhookHandler,
    ProcessRefundHandler,
};
use gatherly_payments::domain::connect::{AccountSnapshot, ConnectAccount};
use gatherly_payments::domain::fees::{FeeCalculator, Pricing};
use gatherly_payments::domain::ids::{AccountId, EventId, IntentId, UserId};
use gatherly_payments::domain::payment::{
    IntentMetadata, IntentStatus, PaymentIntent, PaymentKind, PaymentRecord,
};
use gatherly_payments::domain::refund::RefundPolicy;
use gatherly_payments::ports::{
    AccountLink, CreateAccountRequest, CreateIntentRequest, EventRecord, EventStore, GatewayError,
    GatewayEvent, PaymentGateway, PaymentRecordStore, Refund, UserRecord, UserStore,
    WebhookChannel,
};

use async_trait::async_trait;

// =============================================================================
// Test Infrastructure
// =============================================================================

const VALID_SIGNATURE: &str = "t=1700000000,v1=valid";

/// Mock payment gateway. Captures writes; webhook verification accepts
/// exactly one canned signature and returns the configured event.
#[derive(Default)]
struct MockGateway {
    created: Mutex<Vec<CreateIntentRequest>>,
    refunds: Mutex<Vec<(IntentId, i64)>>,
    retrievable_intent: Mutex<Option<PaymentIntent>>,
    webhook_event: Mutex<Option<GatewayEvent>>,
    account_snapshot: Mutex<Option<AccountSnapshot>>,
}

impl MockGateway {
    fn set_retrievable_intent(&self, intent: PaymentIntent) {
        *self.retrievable_intent.lock().unwrap() = Some(intent);
    }

    fn set_webhook_event(&self, event: GatewayEvent) {
        *self.webhook_event.lock().unwrap() = Some(event);
    }

    fn set_account_snapshot(&self, snapshot: AccountSnapshot) {
        *self.account_snapshot.lock().unwrap() = Some(snapshot);
    }

    fn created_requests(&self) -> Vec<CreateIntentRequest> {
        self.created.lock().unwrap().clone()
    }

    fn issued_refunds(&self) -> Vec<(IntentId, i64)> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(PaymentIntent {
            id: IntentId::new("pi_test_1").unwrap(),
            amount: request.amount_minor,
            currency: request.currency,
            status: IntentStatus::RequiresConfirmation,
            client_secret: Some("pi_test_1_secret_abc".to_string()),
            metadata: request.metadata,
        })
    }

    async fn retrieve_payment_intent(
        &self,
        _intent_id: &IntentId,
    ) -> Result<Option<PaymentIntent>, GatewayError> {
        Ok(self.retrievable_intent.lock().unwrap().clone())
    }

    async fn create_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
    ) -> Result<Refund, GatewayError> {
        self.refunds
            .lock()
            .unwrap()
            .push((intent_id.clone(), amount_minor));
        Ok(Refund {
            id: "re_test_1".to_string(),
            amount_minor,
            status: "succeeded".to_string(),
        })
    }

    async fn create_connect_account(
        &self,
        _request: CreateAccountRequest,
    ) -> Result<AccountId, GatewayError> {
        Ok(AccountId::new("acct_test_1").unwrap())
    }

    async fn create_account_link(
        &self,
        account_id: &AccountId,
        _refresh_url: &str,
        _return_url: &str,
    ) -> Result<AccountLink, GatewayError> {
        Ok(AccountLink {
            url: format!("https://connect.stripe.com/setup/{account_id}"),
            expires_at: Utc::now().timestamp() + 300,
        })
    }

    async fn retrieve_connect_account(
        &self,
        _account_id: &AccountId,
    ) -> Result<AccountSnapshot, GatewayError> {
        Ok(self
            .account_snapshot
            .lock()
            .unwrap()
            .unwrap_or(AccountSnapshot {
                charges_enabled: false,
                payouts_enabled: false,
                details_submitted: false,
            }))
    }

    async fn verify_webhook(
        &self,
        _channel: WebhookChannel,
        _payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, GatewayError> {
        if signature != VALID_SIGNATURE {
            return Err(GatewayError::invalid_webhook("signature mismatch"));
        }
        self.webhook_event
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GatewayError::invalid_webhook("no event configured"))
    }
}

/// The wired router plus handles to its collaborators.
struct TestApp {
    router: Router,
    gateway: Arc<MockGateway>,
    users: Arc<InMemoryUserStore>,
    events: Arc<InMemoryEventStore>,
    payments: Arc<InMemoryPaymentRecordStore>,
}

fn pricing() -> Pricing {
    Pricing {
        platform_fee_rate: 0.05,
        processor_fee_rate: 0.029,
        processor_fixed_fee: 300,
        currency: "usd".to_string(),
        min_ticket_price: 100,
        min_tip: 100,
    }
}

fn test_app() -> TestApp {
    let gateway = Arc::new(MockGateway::default());
    let users = Arc::new(InMemoryUserStore::new());
    let events = Arc::new(InMemoryEventStore::new());
    let payments = Arc::new(InMemoryPaymentRecordStore::new());
    let notifier = Arc::new(InMemoryHostNotifier::new());

    let calculator = FeeCalculator::new(pricing());
    let urls = OnboardingUrls {
        refresh_url: "https://gatherly.test/connect/refresh".to_string(),
        return_url: "https://gatherly.test/connect/return".to_string(),
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
            RefundPolicy::default(),
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
            events.clone(),
            payments.clone(),
            notifier,
        )),
        Arc::new(HandleConnectWebhookHandler::new(
            gateway.clone(),
            users.clone(),
        )),
    );

    let router = Router::new()
        .nest("/api/payments", payment_routes(payment_handlers))
        .nest("/api/connect", connect_routes(connect_handlers))
        .nest("/api/webhooks/stripe", webhook_routes(webhook_handlers));

    TestApp {
        router,
        gateway,
        users,
        events,
        payments,
    }
}

fn payable_connect() -> ConnectAccount {
    let mut account = ConnectAccount::new(AccountId::new("acct_host_1").unwrap(), Utc::now());
    account.apply_snapshot(
        AccountSnapshot {
            charges_enabled: true,
            payouts_enabled: true,
            details_submitted: true,
        },
        Utc::now(),
    );
    account
}

fn host(connect: Option<ConnectAccount>) -> UserRecord {
    let can_pay = connect.as_ref().is_some_and(|c| c.can_accept_payments);
    UserRecord {
        id: UserId::new("host_1").unwrap(),
        email: "host@gatherly.test".to_string(),
        full_name: Some("Hana Host".to_string()),
        connect,
        can_create_paid_events: can_pay,
    }
}

fn payer() -> UserRecord {
    UserRecord {
        id: UserId::new("payer_1").unwrap(),
        email: "payer@gatherly.test".to_string(),
        full_name: None,
        connect: None,
        can_create_paid_events: false,
    }
}

fn paid_event(price: i64, days_out: i64) -> EventRecord {
    EventRecord {
        id: EventId::new("event_1").unwrap(),
        price,
        date: Utc::now() + Duration::days(days_out),
        created_by: UserId::new("host_1").unwrap(),
        attendees: vec![],
    }
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post_webhook(router: Router, uri: &str, signature: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(sig) = signature {
        builder = builder.header("stripe-signature", sig);
    }
    let request = builder.body(Body::from(r#"{"id":"evt_1"}"#)).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn succeeded_intent(metadata: &IntentMetadata) -> PaymentIntent {
    PaymentIntent {
        id: IntentId::new("pi_test_1").unwrap(),
        amount: metadata.breakdown.total_charged,
        currency: "usd".to_string(),
        status: IntentStatus::Succeeded,
        client_secret: None,
        metadata: metadata.to_map(),
    }
}

fn ticket_metadata() -> IntentMetadata {
    IntentMetadata {
        kind: PaymentKind::Ticket,
        event_id: Some(EventId::new("event_1").unwrap()),
        user_id: UserId::new("payer_1").unwrap(),
        host_id: UserId::new("host_1").unwrap(),
        breakdown: FeeCalculator::new(pricing()).ticket_breakdown(50_000).unwrap(),
    }
}

// =============================================================================
// Payment intents
// =============================================================================

#[tokio::test]
async fn event_intent_returns_breakdown_and_client_secret() {
    let app = test_app();
    app.users.insert(host(Some(payable_connect()))).await;
    app.events.insert(paid_event(50_000, 10)).await;

    let (status, body) = post_json(
        app.router,
        "/api/payments/event-intent",
        json!({ "event_id": "event_1", "user_id": "payer_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], 54_250);
    assert_eq!(body["client_secret"], "pi_test_1_secret_abc");
    assert_eq!(body["breakdown"]["event_price"], 50_000);
    assert_eq!(body["breakdown"]["platform_fee"], 2_500);
    assert_eq!(body["breakdown"]["processor_fee"], 1_750);
    assert_eq!(body["breakdown"]["host_receives"], 50_000);

    let created = app.gateway.created_requests();
    assert_eq!(created.len(), 1);
    let transfer = created[0].transfer.as_ref().unwrap();
    assert_eq!(transfer.destination.as_str(), "acct_host_1");
    assert_eq!(transfer.application_fee, 4_250);
}

#[tokio::test]
async fn event_intent_rejects_free_event() {
    let app = test_app();
    app.users.insert(host(Some(payable_connect()))).await;
    app.events.insert(paid_event(0, 10)).await;

    let (status, body) = post_json(
        app.router,
        "/api/payments/event-intent",
        json!({ "event_id": "event_1", "user_id": "payer_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(app.gateway.created_requests().is_empty());
}

#[tokio::test]
async fn event_intent_rejects_host_without_complete_onboarding() {
    let app = test_app();
    // Connect account exists but verification never finished.
    let incomplete = ConnectAccount::new(AccountId::new("acct_host_1").unwrap(), Utc::now());
    app.users.insert(host(Some(incomplete))).await;
    app.events.insert(paid_event(50_000, 10)).await;

    let (status, body) = post_json(
        app.router,
        "/api/payments/event-intent",
        json!({ "event_id": "event_1", "user_id": "payer_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "HOST_NOT_PAYABLE");
}

#[tokio::test]
async fn tip_intent_charges_exactly_the_tip() {
    let app = test_app();
    app.users.insert(host(Some(payable_connect()))).await;

    let (status, body) = post_json(
        app.router,
        "/api/payments/tip-intent",
        json!({ "host_id": "host_1", "user_id": "payer_1", "amount": 2_000 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], 2_000);
    assert_eq!(body["breakdown"]["platform_fee"], 0);

    let created = app.gateway.created_requests();
    assert_eq!(created[0].transfer.as_ref().unwrap().application_fee, 0);
}

// =============================================================================
// Webhooks
// =============================================================================

#[tokio::test]
async fn payment_webhook_records_payment_and_grants_attendance() {
    let app = test_app();
    app.events.insert(paid_event(50_000, 10)).await;

    let metadata = ticket_metadata();
    app.gateway.set_webhook_event(GatewayEvent {
        id: "evt_1".to_string(),
        created_at: Utc::now().timestamp(),
        kind: gatherly_payments::ports::GatewayEventKind::PaymentIntentSucceeded(
            succeeded_intent(&metadata),
        ),
    });

    let (status, body) = post_webhook(
        app.router,
        "/api/webhooks/stripe/payments",
        Some(VALID_SIGNATURE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(body["status"], "recorded");
    assert_eq!(app.payments.count().await, 1);

    let event = app
        .events
        .find_event(&EventId::new("event_1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.attendees, vec![UserId::new("payer_1").unwrap()]);
}

#[tokio::test]
async fn payment_webhook_requires_signature_header() {
    let app = test_app();
    let (status, _) = post_webhook(app.router, "/api/webhooks/stripe/payments", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_webhook_rejects_bad_signature() {
    let app = test_app();
    let (status, body) = post_webhook(
        app.router,
        "/api/webhooks/stripe/payments",
        Some("t=1,v1=wrong"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SIGNATURE_INVALID");
    assert_eq!(app.payments.count().await, 0);
}

#[tokio::test]
async fn connect_webhook_updates_host_capability() {
    let app = test_app();
    app.users.insert(host(Some(payable_connect()))).await;

    // The gateway deverified the account.
    app.gateway.set_webhook_event(GatewayEvent {
        id: "evt_2".to_string(),
        created_at: Utc::now().timestamp(),
        kind: gatherly_payments::ports::GatewayEventKind::AccountUpdated {
            account_id: AccountId::new("acct_host_1").unwrap(),
            snapshot: AccountSnapshot {
                charges_enabled: false,
                payouts_enabled: true,
                details_submitted: true,
            },
        },
    });

    let (status, _) = post_webhook(
        app.router,
        "/api/webhooks/stripe/connect",
        Some(VALID_SIGNATURE),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let user = app
        .users
        .find_user(&UserId::new("host_1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!user.can_create_paid_events);
    assert!(!user.connect.unwrap().can_accept_payments);
}

// =============================================================================
// Refunds
// =============================================================================

#[tokio::test]
async fn refund_full_amount_well_before_event() {
    let app = test_app();
    app.events.insert(paid_event(50_000, 10)).await;

    let metadata = ticket_metadata();
    let intent = succeeded_intent(&metadata);
    app.gateway.set_retrievable_intent(intent.clone());
    app.payments
        .upsert(&PaymentRecord::from_succeeded_intent(
            &intent, &metadata, Utc::now(),
        ))
        .await
        .unwrap();

    let (status, body) = post_json(
        app.router,
        "/api/payments/refund",
        json!({ "event_id": "event_1", "user_id": "payer_1", "actor": "attendee" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund_amount"], 50_000);
    assert_eq!(body["fraction"], 1.0);
    assert_eq!(body["breakdown_source"], "metadata");
    assert_eq!(body["refund_id"], "re_test_1");

    let refunds = app.gateway.issued_refunds();
    assert_eq!(refunds, vec![(IntentId::new("pi_test_1").unwrap(), 50_000)]);
}

#[tokio::test]
async fn refund_is_zero_when_event_is_imminent() {
    let app = test_app();
    app.events.insert(paid_event(50_000, 0)).await;

    let metadata = ticket_metadata();
    let intent = succeeded_intent(&metadata);
    app.gateway.set_retrievable_intent(intent.clone());
    app.payments
        .upsert(&PaymentRecord::from_succeeded_intent(
            &intent, &metadata, Utc::now(),
        ))
        .await
        .unwrap();

    let (status, body) = post_json(
        app.router,
        "/api/payments/refund",
        json!({ "event_id": "event_1", "user_id": "payer_1", "actor": "attendee" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund_amount"], 0);
    assert_eq!(body["refund_id"], Value::Null);
    assert!(app.gateway.issued_refunds().is_empty());
}

#[tokio::test]
async fn refund_without_payment_record_is_not_found() {
    let app = test_app();
    app.events.insert(paid_event(50_000, 10)).await;

    let (status, body) = post_json(
        app.router,
        "/api/payments/refund",
        json!({ "event_id": "event_1", "user_id": "payer_1", "actor": "attendee" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// =============================================================================
// Connect onboarding
// =============================================================================

#[tokio::test]
async fn connect_onboarding_flow_creates_account_then_activates() {
    let app = test_app();
    app.users.insert(host(None)).await;

    let (status, body) = post_json(
        app.router.clone(),
        "/api/connect/accounts",
        json!({ "user_id": "host_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["account_id"], "acct_test_1");
    assert_eq!(body["account"]["can_accept_payments"], false);
    assert!(body["onboarding_url"]
        .as_str()
        .unwrap()
        .starts_with("https://connect.stripe.com/setup/"));

    // Host finishes onboarding at the gateway; the status poll picks it up.
    app.gateway.set_account_snapshot(AccountSnapshot {
        charges_enabled: true,
        payouts_enabled: true,
        details_submitted: true,
    });

    let (status, body) = post_json(
        app.router,
        "/api/connect/status",
        json!({ "user_id": "host_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capability"], "active");
    assert_eq!(body["account"]["can_accept_payments"], true);

    let user = app
        .users
        .find_user(&UserId::new("host_1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(user.can_create_paid_events);
}

#[tokio::test]
async fn connect_account_creation_conflicts_when_already_connected() {
    let app = test_app();
    app.users.insert(host(Some(payable_connect()))).await;

    let (status, body) = post_json(
        app.router,
        "/api/connect/accounts",
        json!({ "user_id": "host_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CONNECTED");
}

#[tokio::test]
async fn connect_status_for_unconnected_host_is_not_connected() {
    let app = test_app();
    app.users.insert(host(None)).await;

    let (status, body) = post_json(
        app.router,
        "/api/connect/status",
        json!({ "user_id": "host_1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capability"], "not_connected");
    assert_eq!(body["account"], Value::Null);
}
