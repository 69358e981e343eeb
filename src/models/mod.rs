//! Domain models for the settlement engine.
//!
//! This module contains all core types: rate cards and their accessorial
//! sub-rates, trips and operational delay records, trip pay and cut pay
//! source records, the unified payroll line item projection, and pay
//! periods.

mod cut_pay;
mod line_item;
mod pay_period;
mod rate_card;
mod trip;
mod trip_pay;

pub use cut_pay::{CutPayRequest, CutPayStatus, CutPayType};
pub use line_item::{PayrollLineItem, PayrollLineItemStatus, PayrollSource, PayrollSourceType};
pub use pay_period::{PayPeriod, PayPeriodStatus};
pub use rate_card::{
    AccessorialRate, AccessorialType, RateCard, RateMethod, RateScope, TrailerConfig,
};
pub use trip::{DelayCode, Trip, TripDelay, TripReport};
pub use trip_pay::{TripPay, TripPayStatus};

/// Tolerance used when checking that a pay breakdown reconciles with its
/// stored total. Amounts are rounded to cents, so two independent rounding
/// paths can disagree by at most one cent.
pub const RECONCILIATION_TOLERANCE: &str = "0.01";
