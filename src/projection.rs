//! The payroll line item projector.
//!
//! Maintains the unified ledger entity mirroring either a trip pay record
//! or a cut pay request. Projection is an upsert keyed by the tagged
//! source: first projection creates the line with a full snapshot, later
//! projections resynchronize only the fields that can legitimately change
//! after creation. Previously recorded approval/export timestamps are never
//! dropped when the source has not changed them.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::calculation::{AccessorialBreakdown, display_breakdown, round_to_cents};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CutPayStatus, CutPayType, PayrollLineItem, PayrollLineItemStatus, PayrollSource, TripPayStatus,
    TripReport,
};
use crate::store::PayrollStore;

/// Maps a trip pay status onto the ledger vocabulary. Applied verbatim,
/// with no business logic.
pub fn line_status_for_trip(status: TripPayStatus) -> PayrollLineItemStatus {
    match status {
        TripPayStatus::Pending => PayrollLineItemStatus::Pending,
        TripPayStatus::Calculated => PayrollLineItemStatus::Calculated,
        TripPayStatus::Reviewed => PayrollLineItemStatus::Reviewed,
        TripPayStatus::Approved => PayrollLineItemStatus::Approved,
        TripPayStatus::Paid => PayrollLineItemStatus::Paid,
        TripPayStatus::Disputed => PayrollLineItemStatus::Disputed,
    }
}

/// Maps a cut pay status onto the ledger vocabulary. Rejected requests
/// surface as disputed lines.
pub fn line_status_for_cut(status: CutPayStatus) -> PayrollLineItemStatus {
    match status {
        CutPayStatus::Pending => PayrollLineItemStatus::Pending,
        CutPayStatus::Approved => PayrollLineItemStatus::Approved,
        CutPayStatus::Rejected => PayrollLineItemStatus::Disputed,
        CutPayStatus::Paid => PayrollLineItemStatus::Paid,
    }
}

/// The accessorial bucket values a ledger line currently carries.
fn bucket_decomposition(line: &PayrollLineItem) -> AccessorialBreakdown {
    AccessorialBreakdown {
        drop_and_hook_pay: line.drop_and_hook_pay,
        chain_up_pay: line.chain_up_pay,
        wait_time_pay: line.wait_time_pay,
        other_accessorial_pay: line.other_accessorial_pay,
    }
}

/// Projects source pay records into the unified payroll ledger.
pub struct PayrollLineItemProjector {
    store: Arc<dyn PayrollStore>,
    settings: EngineSettings,
}

impl PayrollLineItemProjector {
    /// Creates a projector over the given store.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        PayrollLineItemProjector { store, settings }
    }

    /// Creates or resynchronizes the ledger line for a trip pay record.
    pub fn project_from_trip_pay(&self, trip_pay_id: Uuid) -> EngineResult<PayrollLineItem> {
        let pay = self.store.get_trip_pay(trip_pay_id)?;
        let trip = self.store.get_trip(pay.trip_id)?;
        let report = self
            .store
            .get_trip_report(trip.id)
            .unwrap_or_else(|| TripReport::empty(trip.id));

        let source = PayrollSource::TripSourced(pay.id);
        let existing = self.store.find_line_item_by_source(source);

        // A reviewer may have redistributed the accessorial buckets through a
        // ledger edit. Keep that decomposition as long as it still sums to the
        // source aggregate; re-derive from the trip report otherwise.
        let breakdown = match existing.as_ref().map(bucket_decomposition) {
            Some(buckets) if buckets.total() == pay.accessorial_pay => buckets,
            _ => display_breakdown(pay.accessorial_pay, &report, &self.settings),
        };

        let mapped_status = line_status_for_trip(pay.status);
        let status = match &existing {
            // Arrival finalization outranks the source's computed state,
            // but not review/approval progress.
            Some(line)
                if line.status == PayrollLineItemStatus::Complete
                    && mapped_status == PayrollLineItemStatus::Calculated =>
            {
                PayrollLineItemStatus::Complete
            }
            _ => mapped_status,
        };

        let now = Utc::now();
        let item = PayrollLineItem {
            id: Uuid::new_v4(),
            source,
            pay_period_id: Some(pay.pay_period_id),
            driver_id: Some(pay.driver_id),
            driver_name: trip.driver_name.clone(),
            origin_terminal: trip.origin_terminal.clone(),
            destination_terminal: trip.destination_terminal.clone(),
            work_date: trip.dispatch_time.date_naive(),
            miles: trip.miles,
            work_hours: existing.as_ref().and_then(|l| l.work_hours),
            drop_and_hook_count: report.drop_and_hook_count,
            chain_up_count: report.chain_up_count,
            wait_time_minutes: report.wait_time_minutes,
            base_pay: pay.base_pay,
            mileage_pay: pay.mileage_pay,
            drop_and_hook_pay: breakdown.drop_and_hook_pay,
            chain_up_pay: breakdown.chain_up_pay,
            wait_time_pay: breakdown.wait_time_pay,
            other_accessorial_pay: breakdown.other_accessorial_pay,
            bonus_pay: pay.bonus,
            deductions: pay.deductions,
            total_gross_pay: pay.total_gross_pay,
            total_cost: existing.as_ref().and_then(|l| l.total_cost),
            status,
            approved_by: pay
                .approved_by
                .clone()
                .or_else(|| existing.as_ref().and_then(|l| l.approved_by.clone())),
            approved_at: pay
                .approved_at
                .or_else(|| existing.as_ref().and_then(|l| l.approved_at)),
            exported_at: existing.as_ref().and_then(|l| l.exported_at),
            notes: existing.as_ref().and_then(|l| l.notes.clone()),
            created_at: now,
            updated_at: now,
        };

        let (created, stored) = self.store.upsert_line_item(item)?;
        info!(
            trip_pay_id = %trip_pay_id,
            line_item_id = %stored.id,
            created,
            status = ?stored.status,
            "Projected trip pay ledger line"
        );
        Ok(stored)
    }

    /// Creates or resynchronizes the ledger line for a cut pay request.
    pub fn project_from_cut_pay(&self, cut_pay_id: Uuid) -> EngineResult<PayrollLineItem> {
        let request = self.store.get_cut_pay(cut_pay_id)?;
        let period = self.store.ensure_period_for(request.requested_date);
        let source = PayrollSource::CutSourced(request.id);
        let existing = self.store.find_line_item_by_source(source);

        let (miles, work_hours) = match request.request_type {
            CutPayType::Miles => (request.quantity, None),
            CutPayType::Hours => (Decimal::ZERO, Some(request.quantity)),
        };

        let now = Utc::now();
        let item = PayrollLineItem {
            id: Uuid::new_v4(),
            source,
            pay_period_id: Some(period.id),
            driver_id: Some(request.driver_id),
            driver_name: request.driver_name.clone(),
            origin_terminal: String::new(),
            destination_terminal: String::new(),
            work_date: request.requested_date,
            miles,
            work_hours,
            drop_and_hook_count: 0,
            chain_up_count: 0,
            wait_time_minutes: 0,
            base_pay: Decimal::ZERO,
            mileage_pay: Decimal::ZERO,
            drop_and_hook_pay: Decimal::ZERO,
            chain_up_pay: Decimal::ZERO,
            wait_time_pay: Decimal::ZERO,
            other_accessorial_pay: Decimal::ZERO,
            bonus_pay: Decimal::ZERO,
            deductions: Decimal::ZERO,
            total_gross_pay: request.total_pay,
            total_cost: existing.as_ref().and_then(|l| l.total_cost),
            status: line_status_for_cut(request.status),
            approved_by: request
                .approved_by
                .clone()
                .or_else(|| existing.as_ref().and_then(|l| l.approved_by.clone())),
            approved_at: request
                .approved_at
                .or_else(|| existing.as_ref().and_then(|l| l.approved_at)),
            exported_at: existing.as_ref().and_then(|l| l.exported_at),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let (created, stored) = self.store.upsert_line_item(item)?;
        info!(
            cut_pay_id = %cut_pay_id,
            line_item_id = %stored.id,
            created,
            "Projected cut pay ledger line"
        );
        Ok(stored)
    }

    /// Finalizes a ledger line after the trip arrives.
    ///
    /// Populates work hours (arrival minus dispatch), finalized mileage,
    /// and the `Complete` status, and recomputes `total_cost` (labor plus
    /// fuel). `total_gross_pay` is left exactly as the rate card priced it.
    pub fn finalize_trip_arrival(&self, trip_id: Uuid) -> EngineResult<PayrollLineItem> {
        let trip = self.store.get_trip(trip_id)?;
        let arrival = trip
            .arrival_time
            .ok_or_else(|| EngineError::MissingPrerequisite {
                trip_id,
                field: "arrival time".to_string(),
            })?;
        let pay = self
            .store
            .find_trip_pay_by_trip(trip_id)
            .ok_or_else(|| EngineError::MissingPrerequisite {
                trip_id,
                field: "trip pay".to_string(),
            })?;

        // Projection first, so finalizing before any resync still works.
        let mut line = self.project_from_trip_pay(pay.id)?;

        let minutes = (arrival - trip.dispatch_time).num_minutes();
        line.work_hours = Some(round_to_cents(
            Decimal::from(minutes) / Decimal::from(60),
        ));
        line.miles = trip.miles;
        line.status = PayrollLineItemStatus::Complete;
        line.total_cost = Some(round_to_cents(pay.total_gross_pay + trip.fuel_cost));
        line.updated_at = Utc::now();

        let (_, stored) = self.store.upsert_line_item(line)?;
        info!(
            trip_id = %trip_id,
            line_item_id = %stored.id,
            work_hours = ?stored.work_hours,
            total_cost = ?stored.total_cost,
            "Finalized ledger line on trip arrival"
        );
        Ok(stored)
    }
}
