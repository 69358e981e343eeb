//! Calculation logic for the settlement engine.
//!
//! This module contains rate card resolution, accessorial pricing and the
//! display-level accessorial breakdown, the trip pay calculator, and the
//! cut pay evaluator.

mod accessorial;
mod cut_pay;
mod rate_resolution;
mod trip_pay;

use rust_decimal::{Decimal, RoundingStrategy};

pub use accessorial::{
    AccessorialBreakdown, accessorial_type_for, display_breakdown, price_accessorials,
};
pub use cut_pay::{CutPayEvaluator, CutPaySubmission};
pub use rate_resolution::{RateContext, resolve_rate_card};
pub use trip_pay::{CalculationOutcome, TripPayCalculator};

/// Rounds a monetary amount to 2 decimal places using round-half-up.
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
