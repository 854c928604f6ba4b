//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the Stripe HTTP API: payment
//! intents with destination charges, refunds, connect accounts, onboarding
//! links, and webhook verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::GatewayConfig;
use crate::domain::connect::AccountSnapshot;
use crate::domain::ids::{AccountId, IntentId};
use crate::domain::payment::PaymentIntent;
use crate::ports::{
    AccountLink, CreateAccountRequest, CreateIntentRequest, GatewayError, GatewayEvent,
    GatewayEventKind, PaymentGateway, Refund, WebhookChannel,
};

use super::types::{
    hex_encode, SignatureHeader, StripeAccount, StripeAccountLink, StripePaymentIntent,
    StripeRefund, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe gateway adapter.
pub struct StripeGateway {
    api_key: SecretString,
    payment_webhook_secret: SecretString,
    connect_webhook_secret: SecretString,
    api_base_url: String,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Create an adapter from the validated gateway configuration.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            api_key: SecretString::new(config.stripe_api_key.clone()),
            payment_webhook_secret: SecretString::new(
                config.stripe_payment_webhook_secret.clone(),
            ),
            connect_webhook_secret: SecretString::new(
                config.stripe_connect_webhook_secret.clone(),
            ),
            api_base_url: "https://api.stripe.com".to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Point the adapter at a different API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn secret_for(&self, channel: WebhookChannel) -> &SecretString {
        match channel {
            WebhookChannel::Payments => &self.payment_webhook_secret,
            WebhookChannel::Connect => &self.connect_webhook_secret,
        }
    }

    /// Verify a webhook signature using HMAC-SHA256.
    ///
    /// Constant-time comparison; timestamp window rejects replayed events.
    fn verify_signature(
        &self,
        channel: WebhookChannel,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), GatewayError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(GatewayError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(GatewayError::invalid_webhook("Event timestamp in future"));
        }

        let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            HmacSha256::new_from_slice(self.secret_for(channel).expose_secret().as_bytes())
                .expect("HMAC can take key of any size");

        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1 {
            tracing::warn!(
                expected_signature = hex_encode(expected_bytes),
                "Invalid webhook signature"
            );
            return Err(GatewayError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a verified webhook payload into a gateway event.
    fn parse_event(&self, payload: &[u8]) -> Result<GatewayEvent, GatewayError> {
        let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            GatewayError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        let kind = match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                let intent: StripePaymentIntent =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        GatewayError::invalid_webhook(format!("Invalid payment intent: {}", e))
                    })?;
                GatewayEventKind::PaymentIntentSucceeded(intent.into_domain()?)
            }
            "account.updated" => {
                let account: StripeAccount = serde_json::from_value(event.data.object.clone())
                    .map_err(|e| {
                        GatewayError::invalid_webhook(format!("Invalid account: {}", e))
                    })?;
                GatewayEventKind::AccountUpdated {
                    account_id: account.account_id()?,
                    snapshot: account.snapshot(),
                }
            }
            other => GatewayEventKind::Other(other.to_string()),
        };

        Ok(GatewayEvent {
            id: event.id,
            created_at: event.created,
            kind,
        })
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(path, error = %error_text, "Stripe API call failed");
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, GatewayError> {
        let url = format!("{}{}", self.api_base_url, path);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        response.json().await.map(Some).map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut params = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        if let Some(transfer) = &request.transfer {
            params.push((
                "transfer_data[destination]".to_string(),
                transfer.destination.to_string(),
            ));
            params.push((
                "application_fee_amount".to_string(),
                transfer.application_fee.to_string(),
            ));
        }

        let intent: StripePaymentIntent = self.post_form("/v1/payment_intents", &params).await?;
        intent.into_domain()
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &IntentId,
    ) -> Result<Option<PaymentIntent>, GatewayError> {
        let path = format!("/v1/payment_intents/{}", intent_id);
        match self.get::<StripePaymentIntent>(&path).await? {
            Some(intent) => Ok(Some(intent.into_domain()?)),
            None => Ok(None),
        }
    }

    async fn create_refund(
        &self,
        intent_id: &IntentId,
        amount_minor: i64,
    ) -> Result<Refund, GatewayError> {
        let params = vec![
            ("payment_intent".to_string(), intent_id.to_string()),
            ("amount".to_string(), amount_minor.to_string()),
        ];

        let refund: StripeRefund = self.post_form("/v1/refunds", &params).await?;

        Ok(Refund {
            id: refund.id,
            amount_minor: refund.amount,
            status: refund.status,
        })
    }

    async fn create_connect_account(
        &self,
        request: CreateAccountRequest,
    ) -> Result<AccountId, GatewayError> {
        let mut params = vec![
            ("type".to_string(), "express".to_string()),
            ("email".to_string(), request.email.clone()),
        ];

        if let Some(name) = &request.full_name {
            params.push(("business_profile[name]".to_string(), name.clone()));
        }

        let account: StripeAccount = self.post_form("/v1/accounts", &params).await?;
        account.account_id()
    }

    async fn create_account_link(
        &self,
        account_id: &AccountId,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, GatewayError> {
        let params = vec![
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];

        let link: StripeAccountLink = self.post_form("/v1/account_links", &params).await?;

        Ok(AccountLink {
            url: link.url,
            expires_at: link.expires_at,
        })
    }

    async fn retrieve_connect_account(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountSnapshot, GatewayError> {
        let path = format!("/v1/accounts/{}", account_id);
        let account: StripeAccount = self
            .get(&path)
            .await?
            .ok_or_else(|| GatewayError::not_found("connect account"))?;
        Ok(account.snapshot())
    }

    async fn verify_webhook(
        &self,
        channel: WebhookChannel,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, GatewayError> {
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            GatewayError::invalid_webhook(e.to_string())
        })?;

        self.verify_signature(channel, payload, &header)?;

        let event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %event.id,
            channel = ?channel,
            "Webhook signature verified"
        );

        Ok(event)
    }
}
