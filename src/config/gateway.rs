//! Payment gateway configuration (Stripe)

use serde::Deserialize;

use super::error::ValidationError;

/// Payment gateway configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Stripe secret API key (sk_test_... or sk_live_...)
    pub stripe_api_key: String,

    /// Signing secret for the payment webhook endpoint (whsec_...)
    pub stripe_payment_webhook_secret: String,

    /// Signing secret for the connect webhook endpoint (whsec_...)
    pub stripe_connect_webhook_secret: String,

    /// URL hosts are sent back to when an onboarding link expires
    #[serde(default = "default_onboarding_refresh_url")]
    pub onboarding_refresh_url: String,

    /// URL hosts land on after completing onboarding
    #[serde(default = "default_onboarding_return_url")]
    pub onboarding_return_url: String,
}

fn default_onboarding_refresh_url() -> String {
    "https://gatherly.app/connect/refresh".to_string()
}

fn default_onboarding_return_url() -> String {
    "https://gatherly.app/connect/return".to_string()
}

impl GatewayConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_payment_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "STRIPE_PAYMENT_WEBHOOK_SECRET",
            ));
        }
        if self.stripe_connect_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "STRIPE_CONNECT_WEBHOOK_SECRET",
            ));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        for secret in [
            &self.stripe_payment_webhook_secret,
            &self.stripe_connect_webhook_secret,
        ] {
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        Ok(())
    }
}
