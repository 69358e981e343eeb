//! Storage abstraction for the settlement engine.
//!
//! All persistent state sits behind the [`PayrollStore`] trait, which is
//! injected into each component's constructor. This keeps the engine free of
//! any global data-access handle and lets unit tests run against the
//! in-memory [`MemoryStore`].
//!
//! Two semantics matter here beyond plain CRUD:
//!
//! - Upserts are atomic conditional writes keyed by a unique reference
//!   (trip id for trip pay, the tagged source for ledger lines). There is no
//!   separate find-then-create sequence for callers to race on.
//! - Pay-period lifecycle guards are evaluated inside the same write section
//!   as the mutation they gate, so a period cannot flip to Locked between
//!   the check and the write.

mod memory;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    CutPayRequest, PayPeriod, PayrollLineItem, PayrollLineItemStatus, PayrollSource,
    PayrollSourceType, RateCard, Trip, TripPay, TripReport,
};

pub use memory::MemoryStore;

/// Filter criteria for querying payroll line items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemFilter {
    /// Include lines with `work_date` on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Include lines with `work_date` on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Match lines whose origin or destination terminal equals this code.
    pub terminal: Option<String>,
    /// Match lines in this status.
    pub status: Option<PayrollLineItemStatus>,
    /// Case-insensitive substring match against the driver name.
    pub driver_search: Option<String>,
    /// Match lines backed by this source type.
    pub source_type: Option<PayrollSourceType>,
}

impl LineItemFilter {
    /// Checks whether a line item satisfies every set criterion.
    pub fn matches(&self, item: &PayrollLineItem) -> bool {
        if let Some(from) = self.date_from {
            if item.work_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if item.work_date > to {
                return false;
            }
        }
        if let Some(terminal) = &self.terminal {
            if &item.origin_terminal != terminal && &item.destination_terminal != terminal {
                return false;
            }
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(search) = &self.driver_search {
            if !item
                .driver_name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(source_type) = self.source_type {
            if item.source.source_type() != source_type {
                return false;
            }
        }
        true
    }
}

/// Sort key for line item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemSort {
    /// Sort by work date.
    WorkDate,
    /// Sort by driver name.
    DriverName,
    /// Sort by total gross pay.
    TotalGrossPay,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Pagination request. Pages are 1-based.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    /// Items per page.
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: 50,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total items matching the filter across all pages.
    pub total: usize,
    /// The 1-based page number.
    pub page: usize,
    /// Items per page.
    pub page_size: usize,
}

/// Sorts and paginates an already-filtered item list.
pub fn sort_and_paginate(
    mut items: Vec<PayrollLineItem>,
    sort: LineItemSort,
    direction: SortDirection,
    page: PageRequest,
) -> Page<PayrollLineItem> {
    match sort {
        LineItemSort::WorkDate => items.sort_by_key(|i| i.work_date),
        LineItemSort::DriverName => items.sort_by(|a, b| a.driver_name.cmp(&b.driver_name)),
        LineItemSort::TotalGrossPay => items.sort_by(|a, b| a.total_gross_pay.cmp(&b.total_gross_pay)),
    }
    if direction == SortDirection::Desc {
        items.reverse();
    }

    let total = items.len();
    let page_number = page.page.max(1);
    let page_size = page.page_size.max(1);
    let start = (page_number - 1).saturating_mul(page_size);
    let items = if start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect()
    };

    Page {
        items,
        total,
        page: page_number,
        page_size,
    }
}

/// The injected repository for all settlement state.
///
/// Methods returning `EngineResult` fail with not-found errors for missing
/// ids, or `InvalidLifecycleTransition` when a guarded mutation hits a
/// period that forbids it.
pub trait PayrollStore: Send + Sync {
    /// Adds a rate card.
    fn insert_rate_card(&self, card: RateCard);

    /// Returns all rate cards.
    fn list_rate_cards(&self) -> Vec<RateCard>;

    /// Adds a trip.
    fn insert_trip(&self, trip: Trip);

    /// Returns a trip by id.
    fn get_trip(&self, trip_id: Uuid) -> EngineResult<Trip>;

    /// Replaces a trip.
    fn update_trip(&self, trip: Trip) -> EngineResult<()>;

    /// Stores or replaces a trip report.
    fn put_trip_report(&self, report: TripReport);

    /// Returns the trip report for a trip, if one has been filed.
    fn get_trip_report(&self, trip_id: Uuid) -> Option<TripReport>;

    /// Atomically inserts or updates a trip pay record keyed by its trip id.
    ///
    /// Returns `(created, stored)` where `created` is true when no record
    /// existed for the trip. Creation requires the pay period to be Open;
    /// updates require the period to still allow line mutation. On update
    /// the existing record's id and creation timestamp are retained.
    fn upsert_trip_pay(&self, pay: TripPay) -> EngineResult<(bool, TripPay)>;

    /// Returns a trip pay record by id.
    fn get_trip_pay(&self, trip_pay_id: Uuid) -> EngineResult<TripPay>;

    /// Returns the trip pay record for a trip, if one exists.
    fn find_trip_pay_by_trip(&self, trip_id: Uuid) -> Option<TripPay>;

    /// Replaces a trip pay record, enforcing the period's line-mutation
    /// guard in the same write section.
    fn update_trip_pay(&self, pay: TripPay) -> EngineResult<()>;

    /// Adds a cut pay request.
    fn insert_cut_pay(&self, request: CutPayRequest);

    /// Returns a cut pay request by id.
    fn get_cut_pay(&self, cut_pay_id: Uuid) -> EngineResult<CutPayRequest>;

    /// Replaces a cut pay request.
    fn update_cut_pay(&self, request: CutPayRequest) -> EngineResult<()>;

    /// Atomically inserts or updates a ledger line keyed by its source.
    ///
    /// Returns `(created, stored)`. On update the existing line's id and
    /// creation timestamp are retained, and the period's line-mutation
    /// guard is enforced in the same write section.
    fn upsert_line_item(&self, item: PayrollLineItem) -> EngineResult<(bool, PayrollLineItem)>;

    /// Returns a ledger line by id.
    fn get_line_item(&self, line_item_id: Uuid) -> EngineResult<PayrollLineItem>;

    /// Returns the ledger line for a source record, if projected.
    fn find_line_item_by_source(&self, source: PayrollSource) -> Option<PayrollLineItem>;

    /// Replaces a ledger line, enforcing the period's line-mutation guard in
    /// the same write section.
    fn update_line_item(&self, item: PayrollLineItem) -> EngineResult<()>;

    /// Records the first export of a ledger line. A line already carrying a
    /// stamp keeps it. Not subject to the line-mutation guard: the stamp is
    /// operational metadata, not an economic edit, and extracts run against
    /// locked periods.
    fn stamp_line_exported(
        &self,
        line_item_id: Uuid,
        at: DateTime<Utc>,
    ) -> EngineResult<PayrollLineItem>;

    /// Returns all ledger lines matching the filter, unsorted.
    fn list_line_items(&self, filter: &LineItemFilter) -> Vec<PayrollLineItem>;

    /// Adds a pay period.
    fn insert_pay_period(&self, period: PayPeriod);

    /// Returns a pay period by id.
    fn get_pay_period(&self, period_id: Uuid) -> EngineResult<PayPeriod>;

    /// Replaces a pay period.
    fn update_pay_period(&self, period: PayPeriod) -> EngineResult<()>;

    /// Returns the pay period covering a date, if one exists.
    fn find_period_covering(&self, date: NaiveDate) -> Option<PayPeriod>;

    /// Returns the period covering a date, creating an Open calendar-month
    /// period when none exists. The returned period may be in any state;
    /// callers apply the appropriate lifecycle guard.
    fn ensure_period_for(&self, date: NaiveDate) -> PayPeriod;
}
