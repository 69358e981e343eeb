//! Trip pay model: one pay computation per completed trip.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lifecycle status of a trip pay record.
///
/// Normal flow is Pending → Calculated → Reviewed → Approved → Paid.
/// Disputed may be entered from any reviewable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPayStatus {
    /// Created but no rate card matched; awaiting manual rate assignment.
    Pending,
    /// A rate card was resolved and amounts computed.
    Calculated,
    /// A reviewer has looked at the record.
    Reviewed,
    /// Approved for payment.
    Approved,
    /// Paid out.
    Paid,
    /// Under dispute.
    Disputed,
}

impl TripPayStatus {
    /// Whether this status is eligible for approval.
    pub fn is_approvable(&self) -> bool {
        matches!(
            self,
            TripPayStatus::Pending | TripPayStatus::Calculated | TripPayStatus::Reviewed
        )
    }
}

/// One pay computation per completed trip.
///
/// Created once per trip and unique by `trip_id`; recalculation mutates the
/// existing record in place, never duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPay {
    /// Unique identifier.
    pub id: Uuid,
    /// The trip this pay belongs to. Unique across all trip pay records.
    pub trip_id: Uuid,
    /// The driver being paid.
    pub driver_id: Uuid,
    /// The pay period covering the trip's dispatch date.
    pub pay_period_id: Uuid,
    /// Flat/hourly base pay.
    pub base_pay: Decimal,
    /// Mileage pay, including any minimum-amount top-up.
    pub mileage_pay: Decimal,
    /// Aggregate accessorial pay priced from the rate card's sub-rates.
    pub accessorial_pay: Decimal,
    /// Discretionary bonus, preserved across recalculation.
    pub bonus: Decimal,
    /// Deductions, preserved across recalculation.
    pub deductions: Decimal,
    /// `base + mileage + accessorial + bonus - deductions`, rounded to cents.
    pub total_gross_pay: Decimal,
    /// Lifecycle status.
    pub status: TripPayStatus,
    /// The resolved rate card; `None` means no rule matched.
    pub rate_card_id: Option<Uuid>,
    /// When amounts were last computed.
    pub calculated_at: Option<DateTime<Utc>>,
    /// When a reviewer marked the record reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Who approved the record.
    pub approved_by: Option<String>,
    /// When the record was paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}
