//! Pay period model and lifecycle states.
//!
//! A pay period is an administrative date range whose state gates which
//! payroll records may still be created or mutated.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lifecycle state of a pay period. Transitions are forward-only:
/// Open → Closed → Locked → Exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriodStatus {
    /// Trips may be added and recalculated.
    Open,
    /// No new trip pay, but existing lines are still editable.
    Closed,
    /// No line mutation permitted.
    Locked,
    /// Terminal; read-only, including the period itself.
    Exported,
}

impl PayPeriodStatus {
    /// The single state this one may transition to, if any.
    pub fn next(&self) -> Option<PayPeriodStatus> {
        match self {
            PayPeriodStatus::Open => Some(PayPeriodStatus::Closed),
            PayPeriodStatus::Closed => Some(PayPeriodStatus::Locked),
            PayPeriodStatus::Locked => Some(PayPeriodStatus::Exported),
            PayPeriodStatus::Exported => None,
        }
    }
}

/// An administrative date range gating payroll mutation.
///
/// # Example
///
/// ```
/// use linehaul_settlement::models::{PayPeriod, PayPeriodStatus};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::for_month(2026, 3).unwrap();
/// assert_eq!(period.status, PayPeriodStatus::Open);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
/// assert!(!period.contains_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Unique identifier.
    pub id: Uuid,
    /// The start date (inclusive).
    pub start_date: NaiveDate,
    /// The end date (inclusive).
    pub end_date: NaiveDate,
    /// Lifecycle state.
    pub status: PayPeriodStatus,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the period was locked.
    pub locked_at: Option<DateTime<Utc>>,
    /// When the period was exported.
    pub exported_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PayPeriod {
    /// Creates an open period covering one calendar month.
    ///
    /// Returns `None` for an invalid year/month combination.
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let end = next_month.pred_opt()?;
        Some(PayPeriod {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            status: PayPeriodStatus::Open,
            closed_at: None,
            locked_at: None,
            exported_at: None,
            created_at: Utc::now(),
        })
    }

    /// Creates an open calendar-month period covering the given date.
    pub fn covering_month_of(date: NaiveDate) -> Self {
        // from_ymd_opt cannot fail for a month taken from a valid date
        PayPeriod::for_month(date.year(), date.month()).unwrap()
    }

    /// Checks if a date falls within this period (inclusive on both ends).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Whether new trip pay records may be created in this period.
    pub fn allows_trip_pay_creation(&self) -> bool {
        matches!(self.status, PayPeriodStatus::Open)
    }

    /// Whether existing ledger lines (and their sources) may be mutated.
    pub fn allows_line_mutation(&self) -> bool {
        matches!(self.status, PayPeriodStatus::Open | PayPeriodStatus::Closed)
    }

    /// Whether the period record itself may still be mutated.
    pub fn allows_period_mutation(&self) -> bool {
        !matches!(self.status, PayPeriodStatus::Exported)
    }
}
