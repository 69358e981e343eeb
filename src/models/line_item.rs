//! The unified payroll ledger line.
//!
//! A [`PayrollLineItem`] is the reviewer-facing projection of either a trip
//! pay record or a cut pay request. The source is a tagged union so every
//! consumer (projection, approval, export) is forced to handle both kinds
//! exhaustively.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::RECONCILIATION_TOLERANCE;

/// The kind of source record backing a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollSourceType {
    /// Backed by a [`super::TripPay`] record.
    TripPay,
    /// Backed by a [`super::CutPayRequest`] record.
    CutPay,
}

/// The source record a ledger line projects, as a tagged union.
///
/// Exactly one source id is carried; a line with no source reference cannot
/// be constructed.
///
/// # Example
///
/// ```
/// use linehaul_settlement::models::{PayrollSource, PayrollSourceType};
/// use uuid::Uuid;
///
/// let source = PayrollSource::TripSourced(Uuid::nil());
/// assert_eq!(source.source_type(), PayrollSourceType::TripPay);
/// assert_eq!(source.source_id(), Uuid::nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source_type", content = "source_id", rename_all = "snake_case")]
pub enum PayrollSource {
    /// The line projects a trip pay record.
    #[serde(rename = "trip_pay")]
    TripSourced(Uuid),
    /// The line projects a cut pay request.
    #[serde(rename = "cut_pay")]
    CutSourced(Uuid),
}

impl PayrollSource {
    /// The discriminant tag for this source.
    pub fn source_type(&self) -> PayrollSourceType {
        match self {
            PayrollSource::TripSourced(_) => PayrollSourceType::TripPay,
            PayrollSource::CutSourced(_) => PayrollSourceType::CutPay,
        }
    }

    /// The id of the underlying source record.
    pub fn source_id(&self) -> Uuid {
        match self {
            PayrollSource::TripSourced(id) | PayrollSource::CutSourced(id) => *id,
        }
    }
}

/// The lifecycle status of a ledger line.
///
/// Mirrors the source status vocabulary (see the projection mapping tables),
/// plus `Complete`, which is set by trip-arrival finalization and has no
/// source-status counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollLineItemStatus {
    /// Awaiting a rate or review.
    Pending,
    /// Amounts computed from a resolved rate card.
    Calculated,
    /// Reviewed.
    Reviewed,
    /// Approved for payment.
    Approved,
    /// Paid out.
    Paid,
    /// Disputed (also maps rejected cut pay requests).
    Disputed,
    /// Trip arrived and operational fields were finalized.
    Complete,
}

/// The unified, queryable payroll ledger line.
///
/// Carries a denormalized snapshot of driver identity, route, dates, the
/// full pay breakdown, and operational counts. For trip-sourced lines the
/// breakdown must always reconcile with the stored total:
/// `base + mileage + drop_and_hook + chain_up + wait_time + other + bonus -
/// deductions == total_gross_pay` within one cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollLineItem {
    /// Unique identifier.
    pub id: Uuid,
    /// The source record this line projects.
    #[serde(flatten)]
    pub source: PayrollSource,
    /// The pay period the line belongs to.
    pub pay_period_id: Option<Uuid>,
    /// The driver being paid.
    pub driver_id: Option<Uuid>,
    /// Denormalized driver display name.
    pub driver_name: String,
    /// Origin terminal code (empty for cut-sourced lines with no trip).
    pub origin_terminal: String,
    /// Destination terminal code.
    pub destination_terminal: String,
    /// The date of the underlying trip or requested work.
    pub work_date: NaiveDate,
    /// Trip miles (finalized on arrival).
    pub miles: Decimal,
    /// Work hours, populated by arrival finalization.
    pub work_hours: Option<Decimal>,
    /// Drop-and-hook events from the trip report.
    pub drop_and_hook_count: u32,
    /// Chain-up cycles from the trip report.
    pub chain_up_count: u32,
    /// Wait-time minutes from the trip report.
    pub wait_time_minutes: u32,
    /// Base pay component.
    pub base_pay: Decimal,
    /// Mileage pay component.
    pub mileage_pay: Decimal,
    /// Display bucket: drop-and-hook accessorial pay.
    pub drop_and_hook_pay: Decimal,
    /// Display bucket: chain-up accessorial pay.
    pub chain_up_pay: Decimal,
    /// Display bucket: wait-time accessorial pay.
    pub wait_time_pay: Decimal,
    /// Display bucket: accessorial pay not attributed to a named bucket.
    pub other_accessorial_pay: Decimal,
    /// Bonus component.
    pub bonus_pay: Decimal,
    /// Deductions.
    pub deductions: Decimal,
    /// The authoritative total, always derived from the rate-card-priced
    /// aggregate, never from the display buckets.
    pub total_gross_pay: Decimal,
    /// Labor plus fuel, recomputed by arrival finalization.
    pub total_cost: Option<Decimal>,
    /// Lifecycle status.
    pub status: PayrollLineItemStatus,
    /// Who approved the line's source.
    pub approved_by: Option<String>,
    /// When the line's source was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the line was exported to the payroll system.
    pub exported_at: Option<DateTime<Utc>>,
    /// Free-text notes (editable on cut-sourced lines).
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl PayrollLineItem {
    /// The sum of all pay components:
    /// `base + mileage + display buckets + bonus - deductions`.
    pub fn breakdown_total(&self) -> Decimal {
        self.base_pay
            + self.mileage_pay
            + self.drop_and_hook_pay
            + self.chain_up_pay
            + self.wait_time_pay
            + self.other_accessorial_pay
            + self.bonus_pay
            - self.deductions
    }

    /// Checks the reconciliation invariant for trip-sourced lines: the
    /// component sum must agree with the stored total within one cent.
    /// Cut-sourced lines carry only an aggregate total and always reconcile.
    pub fn reconciles(&self) -> bool {
        match self.source {
            PayrollSource::CutSourced(_) => true,
            PayrollSource::TripSourced(_) => {
                let tolerance = Decimal::from_str(RECONCILIATION_TOLERANCE).unwrap();
                (self.breakdown_total() - self.total_gross_pay).abs() <= tolerance
            }
        }
    }
}
