//! Fee calculator - splits a ticket or tip charge between platform and host.
//!
//! All amounts are integers in the smallest currency unit (cents). Fractional
//! rates are applied exactly once per fee and immediately rounded half away
//! from zero back to a minor-unit integer, so no running float state exists.
//!
//! # Fee model
//!
//! - **Tickets**: the payer absorbs both fees. `total_charged = price +
//!   platform_fee + processor_fee`; the host always receives exactly the price
//!   they set, and only the price is ever refundable.
//! - **Tips**: no platform cut, and the payer is charged exactly the tip.
//!   The processor fee is still computed and recorded on the breakdown so
//!   payout reports can account for it.

use serde::{Deserialize, Serialize};

/// Pricing configuration, loaded once at startup and injected into the
/// calculator. Immutable at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct Pricing {
    /// Platform cut as a fraction of the ticket price. Must be in `[0, 1)`.
    pub platform_fee_rate: f64,

    /// Processor percentage fee as a fraction. Must be in `[0, 1)`.
    pub processor_fee_rate: f64,

    /// Processor fixed fee per charge, in minor units.
    pub processor_fixed_fee: i64,

    /// ISO 4217 currency code (lowercase, as Stripe expects).
    pub currency: String,

    /// Minimum chargeable ticket price, in minor units.
    pub min_ticket_price: i64,

    /// Minimum tip amount, in minor units.
    pub min_tip: i64,
}

impl Pricing {
    /// Validate rate and fee invariants.
    pub fn validate(&self) -> Result<(), FeeError> {
        if !(0.0..1.0).contains(&self.platform_fee_rate) {
            return Err(FeeError::InvalidRate("platform_fee_rate"));
        }
        if !(0.0..1.0).contains(&self.processor_fee_rate) {
            return Err(FeeError::InvalidRate("processor_fee_rate"));
        }
        if self.processor_fixed_fee < 0 {
            return Err(FeeError::InvalidRate("processor_fixed_fee"));
        }
        if self.min_ticket_price < 0 || self.min_tip < 0 {
            return Err(FeeError::InvalidRate("minimum amounts"));
        }
        Ok(())
    }
}

/// Per-transaction fee breakdown. Never persisted standalone; embedded as
/// metadata on the payment intent so it can be recovered later without
/// recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// The price the host set (or the tip amount), in minor units.
    pub event_price: i64,

    /// Platform cut. Always 0 for tips.
    pub platform_fee: i64,

    /// Processor percentage + fixed fee.
    pub processor_fee: i64,

    /// What the payer's card is charged.
    pub total_charged: i64,

    /// What the host receives. Equals `event_price` for tickets and the full
    /// tip for tips.
    pub host_receives: i64,

    /// The portion eligible for refund under policy. Fees are never
    /// refundable.
    pub refundable_amount: i64,
}

/// Errors from fee computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    /// The amount is negative or below the configured minimum.
    #[error("amount {amount} is below the minimum of {minimum}")]
    AmountBelowMinimum { amount: i64, minimum: i64 },

    /// A configured rate or fee is outside its valid range.
    #[error("invalid pricing configuration: {0}")]
    InvalidRate(&'static str),
}

/// Computes fee breakdowns from an injected, immutable [`Pricing`].
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    pricing: Pricing,
}

impl FeeCalculator {
    pub fn new(pricing: Pricing) -> Self {
        Self { pricing }
    }

    /// The currency every breakdown is denominated in.
    pub fn currency(&self) -> &str {
        &self.pricing.currency
    }

    /// Compute the breakdown for a ticket purchase.
    ///
    /// The payer absorbs both fees on top of the price; the host receives
    /// exactly the price they set.
    pub fn ticket_breakdown(&self, event_price: i64) -> Result<FeeBreakdown, FeeError> {
        if event_price < self.pricing.min_ticket_price {
            return Err(FeeError::AmountBelowMinimum {
                amount: event_price,
                minimum: self.pricing.min_ticket_price,
            });
        }

        let platform_fee = apply_rate(event_price, self.pricing.platform_fee_rate);
        let processor_fee =
            apply_rate(event_price, self.pricing.processor_fee_rate) + self.pricing.processor_fixed_fee;

        Ok(FeeBreakdown {
            event_price,
            platform_fee,
            processor_fee,
            total_charged: event_price + platform_fee + processor_fee,
            host_receives: event_price,
            refundable_amount: event_price,
        })
    }

    /// Compute the breakdown for a tip.
    ///
    /// The payer is charged exactly the tip and the platform takes no cut.
    /// The processor fee is recorded for audit only.
    pub fn tip_breakdown(&self, tip: i64) -> Result<FeeBreakdown, FeeError> {
        if tip < self.pricing.min_tip {
            return Err(FeeError::AmountBelowMinimum {
                amount: tip,
                minimum: self.pricing.min_tip,
            });
        }

        let processor_fee =
            apply_rate(tip, self.pricing.processor_fee_rate) + self.pricing.processor_fixed_fee;

        Ok(FeeBreakdown {
            event_price: tip,
            platform_fee: 0,
            processor_fee,
            total_charged: tip,
            host_receives: tip,
            refundable_amount: tip,
        })
    }

    /// Estimate the original ticket price from a charged total by inverting
    /// the fee formula. Used only for legacy charges missing metadata.
    pub fn estimate_price_from_total(&self, total_charged: i64) -> i64 {
        let divisor = 1.0 + self.pricing.platform_fee_rate + self.pricing.processor_fee_rate;
        (((total_charged - self.pricing.processor_fixed_fee) as f64) / divisor).round() as i64
    }
}

/// Apply a fractional rate to a minor-unit amount, rounding half away from
/// zero. `f64::round` implements exactly that tie-break.
fn apply_rate(amount: i64, rate: f64) -> i64 {
    (amount as f64 * rate).round() as i64
}
