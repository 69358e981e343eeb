//! Accessorial pricing and the display-level breakdown.
//!
//! Two distinct responsibilities that must never be mixed:
//!
//! 1. **Pricing**: matching a trip's delay records to the resolved rate
//!    card's accessorial sub-rates. This aggregate feeds `total_gross_pay`.
//! 2. **Display decomposition**: splitting the priced aggregate into
//!    drop-and-hook, chain-up, wait-time, and "other" buckets for the
//!    ledger projection, using fixed unit rates applied to trip-report
//!    counts. The buckets are a reporting convenience and never feed the
//!    total.

use rust_decimal::Decimal;

use crate::config::EngineSettings;
use crate::models::{AccessorialType, DelayCode, RateCard, RateMethod, TripDelay, TripReport};

use super::round_to_cents;

/// Maps a delay code to the accessorial type that prices it.
///
/// Unmapped codes contribute zero pay and are not errors.
pub fn accessorial_type_for(code: DelayCode) -> Option<AccessorialType> {
    match code {
        DelayCode::Detention => Some(AccessorialType::Detention),
        DelayCode::EquipmentBreakdown => Some(AccessorialType::Breakdown),
        DelayCode::DriverUnavailability => Some(AccessorialType::Layover),
        DelayCode::Weather | DelayCode::Traffic | DelayCode::Other => None,
    }
}

/// Prices a trip's delay records against a rate card's accessorial
/// sub-rates.
///
/// Hourly sub-rates charge `duration-in-hours x rate`; every other method
/// charges the rate flat. Each charge is clamped to the sub-rate's
/// min/max before summing. Delays with no mapped sub-rate contribute zero.
pub fn price_accessorials(delays: &[TripDelay], card: &RateCard) -> Decimal {
    let mut total = Decimal::ZERO;
    for delay in delays {
        let Some(accessorial_type) = accessorial_type_for(delay.code) else {
            continue;
        };
        let Some(sub_rate) = card.accessorial_for(accessorial_type) else {
            continue;
        };
        let charge = match sub_rate.method {
            RateMethod::Hourly => delay.duration_hours() * sub_rate.rate,
            _ => sub_rate.rate,
        };
        total += sub_rate.clamp(charge);
    }
    round_to_cents(total)
}

/// The display-level decomposition of an accessorial aggregate.
///
/// The four buckets always sum exactly to the aggregate they decompose, so
/// a ledger line built from them reconciles by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorialBreakdown {
    /// Drop-and-hook bucket.
    pub drop_and_hook_pay: Decimal,
    /// Chain-up bucket.
    pub chain_up_pay: Decimal,
    /// Wait-time bucket.
    pub wait_time_pay: Decimal,
    /// Whatever the named buckets do not account for.
    pub other_accessorial_pay: Decimal,
}

impl AccessorialBreakdown {
    /// An all-zero breakdown.
    pub fn zero() -> Self {
        AccessorialBreakdown {
            drop_and_hook_pay: Decimal::ZERO,
            chain_up_pay: Decimal::ZERO,
            wait_time_pay: Decimal::ZERO,
            other_accessorial_pay: Decimal::ZERO,
        }
    }

    /// The sum of all four buckets.
    pub fn total(&self) -> Decimal {
        self.drop_and_hook_pay + self.chain_up_pay + self.wait_time_pay + self.other_accessorial_pay
    }
}

/// Decomposes the rate-card-priced accessorial aggregate into display
/// buckets using fixed unit rates applied to trip-report counts.
///
/// Buckets are filled in order (drop-and-hook, chain-up, wait-time), each
/// capped at whatever aggregate remains; the remainder lands in "other".
/// The bucket sum therefore always equals the aggregate, preserving the
/// line-item reconciliation invariant. The unit rates here are independent
/// of the rates actually used to price the aggregate.
pub fn display_breakdown(
    aggregate: Decimal,
    report: &TripReport,
    settings: &EngineSettings,
) -> AccessorialBreakdown {
    if aggregate <= Decimal::ZERO {
        return AccessorialBreakdown::zero();
    }

    let mut remaining = aggregate;

    let drop_and_hook = round_to_cents(
        Decimal::from(report.drop_and_hook_count) * settings.drop_and_hook_rate,
    )
    .min(remaining);
    remaining -= drop_and_hook;

    let chain_up =
        round_to_cents(Decimal::from(report.chain_up_count) * settings.chain_up_rate).min(remaining);
    remaining -= chain_up;

    let wait_hours = Decimal::from(report.wait_time_minutes) / Decimal::from(60);
    let wait_time = round_to_cents(wait_hours * settings.wait_time_hourly_rate).min(remaining);
    remaining -= wait_time;

    AccessorialBreakdown {
        drop_and_hook_pay: drop_and_hook,
        chain_up_pay: chain_up,
        wait_time_pay: wait_time,
        other_accessorial_pay: remaining,
    }
}
