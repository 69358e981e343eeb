//! Cut pay request model: manually requested, non-trip compensation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TrailerConfig;

/// Whether a cut pay request is quantified in hours or miles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutPayType {
    /// Quantity is worked hours, priced at an hourly rate.
    Hours,
    /// Quantity is miles, priced at the per-mile rate for the trailer
    /// configuration.
    Miles,
}

/// The lifecycle status of a cut pay request.
///
/// Requests move Pending → Approved or Rejected, and Approved → Paid.
/// The lifecycle is independent of trip pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutPayStatus {
    /// Submitted, awaiting review.
    Pending,
    /// Approved for payment.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
    /// Paid out.
    Paid,
}

impl CutPayStatus {
    /// Whether this status is eligible for approval.
    pub fn is_approvable(&self) -> bool {
        matches!(self, CutPayStatus::Pending)
    }
}

/// A manual pay request, independent of any trip pay computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPayRequest {
    /// Unique identifier.
    pub id: Uuid,
    /// The driver requesting pay.
    pub driver_id: Uuid,
    /// Denormalized driver display name.
    pub driver_name: String,
    /// An associated trip, if the request relates to one.
    pub trip_id: Option<Uuid>,
    /// Hours- or miles-based.
    pub request_type: CutPayType,
    /// The quantity requested (hours or miles).
    pub quantity: Decimal,
    /// The rate that was applied to the quantity.
    pub rate_applied: Decimal,
    /// Trailer configuration, used to pick a per-mile rate for miles
    /// requests.
    pub trailer_config: TrailerConfig,
    /// `quantity * rate_applied`, rounded to cents.
    pub total_pay: Decimal,
    /// Lifecycle status.
    pub status: CutPayStatus,
    /// Who approved or rejected the request.
    pub approved_by: Option<String>,
    /// When the request was approved or rejected.
    pub approved_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// The date the requested work occurred.
    pub requested_date: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_approvable() {
        assert!(CutPayStatus::Pending.is_approvable());
        assert!(!CutPayStatus::Approved.is_approvable());
        assert!(!CutPayStatus::Rejected.is_approvable());
        assert!(!CutPayStatus::Paid.is_approvable());
    }

    #[test]
    fn test_request_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CutPayType::Hours).unwrap(),
            "\"hours\""
        );
        assert_eq!(
            serde_json::to_string(&CutPayType::Miles).unwrap(),
            "\"miles\""
        );
    }
}
