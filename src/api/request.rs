//! Request types for the settlement engine API.
//!
//! DTOs convert into domain types with `From` implementations, so handlers
//! stay thin and the domain modules never see HTTP shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::approval::ApprovalItem;
use crate::calculation::CutPaySubmission;
use crate::models::{CutPayType, PayPeriodStatus, PayrollLineItemStatus, PayrollSourceType, TrailerConfig};
use crate::store::{LineItemFilter, LineItemSort, PageRequest, SortDirection};

/// Request body for `POST /trip-pay/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripCalculationRequest {
    /// The trip to calculate pay for.
    pub trip_id: Uuid,
}

/// Request body for `POST /cut-pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutPayRequestBody {
    /// The requesting driver.
    pub driver_id: Uuid,
    /// Driver display name.
    pub driver_name: String,
    /// An associated trip, if any.
    #[serde(default)]
    pub trip_id: Option<Uuid>,
    /// Hours- or miles-based.
    pub request_type: CutPayType,
    /// The quantity requested.
    pub quantity: Decimal,
    /// Trailer count, mapped to a configuration for per-mile pricing.
    #[serde(default)]
    pub trailer_count: u32,
    /// Explicit rate, overriding rate card resolution.
    #[serde(default)]
    pub rate_override: Option<Decimal>,
    /// The date the requested work occurred.
    pub requested_date: NaiveDate,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CutPayRequestBody> for CutPaySubmission {
    fn from(body: CutPayRequestBody) -> Self {
        CutPaySubmission {
            driver_id: body.driver_id,
            driver_name: body.driver_name,
            trip_id: body.trip_id,
            request_type: body.request_type,
            quantity: body.quantity,
            trailer_config: TrailerConfig::from_trailer_count(body.trailer_count),
            rate_override: body.rate_override,
            requested_date: body.requested_date,
            notes: body.notes,
        }
    }
}

/// Query parameters for `GET /line-items` and `GET /export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemQuery {
    /// Include lines on or after this date.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Include lines on or before this date.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Match lines touching this terminal.
    #[serde(default)]
    pub terminal: Option<String>,
    /// Match lines in this status.
    #[serde(default)]
    pub status: Option<PayrollLineItemStatus>,
    /// Case-insensitive driver name search.
    #[serde(default)]
    pub driver_search: Option<String>,
    /// Match lines backed by this source type.
    #[serde(default)]
    pub source_type: Option<PayrollSourceType>,
    /// Sort key.
    #[serde(default = "default_sort")]
    pub sort: LineItemSort,
    /// Sort direction.
    #[serde(default = "default_direction")]
    pub direction: SortDirection,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_sort() -> LineItemSort {
    LineItemSort::WorkDate
}

fn default_direction() -> SortDirection {
    SortDirection::Asc
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    50
}

impl LineItemQuery {
    /// The filter portion of the query.
    pub fn filter(&self) -> LineItemFilter {
        LineItemFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            terminal: self.terminal.clone(),
            status: self.status,
            driver_search: self.driver_search.clone(),
            source_type: self.source_type,
        }
    }

    /// The pagination portion of the query.
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Request body for `POST /line-items/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkApprovalRequest {
    /// Who is approving.
    pub approver: String,
    /// The batch to approve.
    pub items: Vec<ApprovalItem>,
}

/// Request body for `POST /pay-periods/{id}/transition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// The state to move the period into.
    pub target: PayPeriodStatus,
}

/// Request body for `POST /trips/{id}/arrival`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalRequest {
    /// When the trip arrived.
    pub arrival_time: DateTime<Utc>,
}
