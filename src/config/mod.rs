//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `GATHERLY` prefix
//! and `__` (double underscore) separating nested sections.
//!
//! # Example
//!
//! ```no_run
//! use gatherly_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod gateway;
mod server;

pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::domain::fees::Pricing;
use crate::domain::refund::RefundPolicy;

/// Root application configuration
///
/// Load using [`AppConfig::load()`], then call [`AppConfig::validate()`]
/// before wiring anything. The pricing and refund sections deserialize
/// directly into their domain value objects so there is exactly one source
/// of truth for fee arithmetic parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment gateway configuration (Stripe keys and webhook secrets)
    pub gateway: GatewayConfig,

    /// Fee arithmetic parameters
    pub pricing: Pricing,

    /// Refund policy table
    #[serde(default)]
    pub refund: RefundPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads environment variables with the `GATHERLY` prefix
    /// 3. Uses `__` to separate nested values, e.g.
    ///    `GATHERLY__PRICING__PLATFORM_FEE_RATE=0.05`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GATHERLY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any value is semantically invalid
    /// (rates out of range, bad key prefixes, inverted refund buckets).
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.pricing
            .validate()
            .map_err(|e| ValidationError::InvalidPricing(e.to_string()))?;
        self.refund
            .validate()
            .map_err(ValidationError::InvalidRefundPolicy)?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
