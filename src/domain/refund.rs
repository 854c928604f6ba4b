//! Refund policy engine - maps a cancellation to a refund amount.
//!
//! Two pure steps: `refund_fraction` selects a fraction from the policy table
//! based on who cancels and how far out the event is, and `refund_amount`
//! applies that fraction to the refundable base of a fee breakdown.
//!
//! Fees (platform and processor) are never included in any refund, regardless
//! of actor or timing. This is an audited business decision, not an oversight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fees::{FeeBreakdown, FeeCalculator};

/// Who initiated the cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationActor {
    /// The ticket holder cancelled; the bucket table and the minimum-hours
    /// floor both apply.
    Attendee,

    /// The host cancelled the event; attendees are always made whole.
    Host,
}

/// Static refund policy table, loaded from configuration.
///
/// Buckets are evaluated high to low on whole days until the event:
/// `>= full_refund_days` -> 1.0, `>= half_refund_days` -> 0.5, below -> 0.0.
/// The `min_refund_hours` floor forces 0.0 for attendee cancellations when the
/// event start is imminent, overriding the table even inside the top bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundPolicy {
    /// Days before the event at or above which attendees get a full refund.
    #[serde(default = "default_full_refund_days")]
    pub full_refund_days: i64,

    /// Days before the event at or above which attendees get a half refund.
    #[serde(default = "default_half_refund_days")]
    pub half_refund_days: i64,

    /// Hard floor: attendee refunds are 0 when the event starts within this
    /// many hours.
    #[serde(default = "default_min_refund_hours")]
    pub min_refund_hours: i64,
}

fn default_full_refund_days() -> i64 {
    7
}

fn default_half_refund_days() -> i64 {
    3
}

fn default_min_refund_hours() -> i64 {
    24
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            full_refund_days: default_full_refund_days(),
            half_refund_days: default_half_refund_days(),
            min_refund_hours: default_min_refund_hours(),
        }
    }
}

impl RefundPolicy {
    /// Ordering and non-negativity of the table parameters.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.half_refund_days < 0 || self.min_refund_hours < 0 {
            return Err("refund policy parameters must be non-negative");
        }
        if self.full_refund_days < self.half_refund_days {
            return Err("full_refund_days must not be below half_refund_days");
        }
        Ok(())
    }

    /// Select the refund fraction for a cancellation.
    ///
    /// Host cancellations return 1.0 unconditionally, bypassing the floor.
    pub fn refund_fraction(
        &self,
        event_date: DateTime<Utc>,
        now: DateTime<Utc>,
        actor: CancellationActor,
    ) -> f64 {
        if actor == CancellationActor::Host {
            return 1.0;
        }

        let until_event = event_date - now;

        // Floor rule first: an imminent event yields nothing even when the
        // day bucket would.
        if until_event < chrono::Duration::hours(self.min_refund_hours) {
            return 0.0;
        }

        let days = until_event.num_days(); // floored whole days
        if days >= self.full_refund_days {
            1.0
        } else if days >= self.half_refund_days {
            0.5
        } else {
            0.0
        }
    }

    /// Apply a fraction to the refundable base, respecting what was already
    /// refunded. Returns 0 (a no-op, not an error) when nothing remains.
    pub fn refund_amount(
        &self,
        breakdown: &FeeBreakdown,
        fraction: f64,
        already_refunded: i64,
    ) -> i64 {
        let max_refundable = (breakdown.refundable_amount - already_refunded).max(0);
        let desired = (breakdown.refundable_amount as f64 * fraction).floor() as i64;
        desired.min(max_refundable).max(0)
    }
}

/// How the fee breakdown used for a refund was obtained.
///
/// Intents created by this system carry their breakdown as metadata. Older
/// charges predate that, so the breakdown must be reconstructed by inverting
/// the fee formula from the charged total. The tag keeps the two auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "breakdown")]
pub enum RecoveredBreakdown {
    /// Breakdown read back verbatim from intent metadata.
    Metadata(FeeBreakdown),

    /// Breakdown reconstructed from the charged total. The estimate keeps the
    /// additive invariant exact against the observed total by absorbing any
    /// rounding residue into the processor fee.
    LegacyReconstructed(FeeBreakdown),
}

impl RecoveredBreakdown {
    pub fn breakdown(&self) -> &FeeBreakdown {
        match self {
            RecoveredBreakdown::Metadata(b) | RecoveredBreakdown::LegacyReconstructed(b) => b,
        }
    }

    /// Recover a ticket breakdown, preferring metadata.
    pub fn for_ticket(
        metadata: Option<FeeBreakdown>,
        total_charged: i64,
        calculator: &FeeCalculator,
    ) -> Self {
        match metadata {
            Some(b) => RecoveredBreakdown::Metadata(b),
            None => RecoveredBreakdown::LegacyReconstructed(reconstruct_ticket(
                total_charged,
                calculator,
            )),
        }
    }
}

/// Invert the ticket fee formula from a charged total.
///
/// Estimates the price as `(total - fixed) / (1 + rates)`, recomputes the
/// fees for that price, then pins the processor fee so the parts sum to the
/// observed total exactly.
fn reconstruct_ticket(total_charged: i64, calculator: &FeeCalculator) -> FeeBreakdown {
    let price = calculator.estimate_price_from_total(total_charged);
    match calculator.ticket_breakdown(price) {
        Ok(mut b) => {
            b.total_charged = total_charged;
            b.processor_fee = total_charged - b.event_price - b.platform_fee;
            b
        }
        // Total below chargeable minimum: treat the whole amount as price so
        // the refundable base is never negative.
        Err(_) => FeeBreakdown {
            event_price: total_charged.max(0),
            platform_fee: 0,
            processor_fee: 0,
            total_charged: total_charged.max(0),
            host_receives: total_charged.max(0),
            refundable_amount: total_charged.max(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fees::Pricing;
    use chrono::Duration;
    use proptest::prelude::*;

    fn policy() -> RefundPolicy {
        RefundPolicy::default()
    }

    fn calculator() -> FeeCalculator {
        FeeCalculator::new(Pricing {
            platform_fee_rate: 0.05,
            processor_fee_rate: 0.029,
            processor_fixed_fee: 300,
            currency: "usd".to_string(),
            min_ticket_price: 100,
            min_tip: 100,
        })
    }

    fn breakdown(price: i64) -> FeeBreakdown {
        calculator().ticket_breakdown(price).unwrap()
    }

    #[test]
    fn attendee_eight_days_out_gets_full_refund() {
        let now = Utc::now();
        let f = policy().refund_fraction(now + Duration::days(8), now, CancellationActor::Attendee);
        assert_eq!(f, 1.0);

        let b = breakdown(50_000);
        assert_eq!(policy().refund_amount(&b, f, 0), 50_000);
    }

    #[test]
    fn attendee_five_days_out_gets_half() {
        let now = Utc::now();
        let f = policy().refund_fraction(now + Duration::days(5), now, CancellationActor::Attendee);
        assert_eq!(f, 0.5);
    }

    #[test]
    fn attendee_one_day_out_gets_nothing() {
        let now = Utc::now();
        // 1 day = 24h, not strictly within the 24h floor, but below the
        // 3-day bucket anyway.
        let f = policy().refund_fraction(now + Duration::days(1), now, CancellationActor::Attendee);
        assert_eq!(f, 0.0);

        let b = breakdown(50_000);
        assert_eq!(policy().refund_amount(&b, f, 0), 0);
    }

    #[test]
    fn floor_overrides_top_bucket() {
        let now = Utc::now();
        let mut p = policy();
        p.min_refund_hours = 24 * 10; // imminent-window larger than the table
        let f = p.refund_fraction(now + Duration::days(8), now, CancellationActor::Attendee);
        assert_eq!(f, 0.0);
    }

    #[test]
    fn host_cancellation_bypasses_floor() {
        let now = Utc::now();
        let f = policy().refund_fraction(now + Duration::hours(1), now, CancellationActor::Host);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn refund_amount_respects_already_refunded() {
        let b = breakdown(50_000);
        assert_eq!(policy().refund_amount(&b, 1.0, 20_000), 30_000);
        assert_eq!(policy().refund_amount(&b, 1.0, 50_000), 0);
        // Over-refunded records clamp to zero rather than going negative.
        assert_eq!(policy().refund_amount(&b, 1.0, 60_000), 0);
    }

    #[test]
    fn refund_amount_floors_fractional_result() {
        let b = breakdown(101);
        // 101 * 0.5 = 50.5 -> 50
        assert_eq!(policy().refund_amount(&b, 0.5, 0), 50);
    }

    #[test]
    fn recovery_prefers_metadata() {
        let b = breakdown(50_000);
        let recovered = RecoveredBreakdown::for_ticket(Some(b.clone()), 54_250, &calculator());
        assert_eq!(recovered, RecoveredBreakdown::Metadata(b));
    }

    #[test]
    fn legacy_reconstruction_matches_observed_total() {
        let original = breakdown(50_000);
        let recovered =
            RecoveredBreakdown::for_ticket(None, original.total_charged, &calculator());

        let b = recovered.breakdown();
        assert!(matches!(recovered, RecoveredBreakdown::LegacyReconstructed(_)));
        assert_eq!(b.total_charged, original.total_charged);
        assert_eq!(b.event_price + b.platform_fee + b.processor_fee, b.total_charged);
        assert_eq!(b.event_price, original.event_price);
    }

    #[test]
    fn policy_validation() {
        assert!(policy().validate().is_ok());

        let p = RefundPolicy {
            full_refund_days: 2,
            half_refund_days: 3,
            min_refund_hours: 24,
        };
        assert!(p.validate().is_err());
    }

    proptest! {
        /// The fraction never increases as the event gets closer.
        #[test]
        fn fraction_monotone_in_time_to_event(hours_a in 0i64..24 * 30, hours_b in 0i64..24 * 30) {
            let now = Utc::now();
            let (far, near) = if hours_a >= hours_b {
                (hours_a, hours_b)
            } else {
                (hours_b, hours_a)
            };
            let f_far = policy().refund_fraction(
                now + Duration::hours(far), now, CancellationActor::Attendee,
            );
            let f_near = policy().refund_fraction(
                now + Duration::hours(near), now, CancellationActor::Attendee,
            );
            prop_assert!(f_far >= f_near);
        }

        /// Repeated refunds never exceed the refundable base.
        #[test]
        fn cumulative_refunds_bounded(price in 100i64..1_000_000, already in 0i64..1_000_000) {
            let b = breakdown(price);
            let refund = policy().refund_amount(&b, 1.0, already);
            prop_assert!(refund >= 0);
            prop_assert!(refund + already.min(b.refundable_amount) <= b.refundable_amount);
        }

        /// Legacy reconstruction always restores the additive invariant.
        #[test]
        fn reconstruction_additive_invariant(price in 100i64..1_000_000) {
            let total = calculator().ticket_breakdown(price).unwrap().total_charged;
            let recovered = RecoveredBreakdown::for_ticket(None, total, &calculator());
            let b = recovered.breakdown();
            prop_assert_eq!(b.event_price + b.platform_fee + b.processor_fee, b.total_charged);
            prop_assert!(b.refundable_amount <= b.total_charged);
        }
    }
}
