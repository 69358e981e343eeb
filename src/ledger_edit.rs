//! Inline edits to payroll ledger lines.
//!
//! Edits never mutate a ledger line directly. Every change is written back
//! to the line's source record (the trip pay or cut pay request, plus the
//! trip itself for operational fields) and the line is then re-projected,
//! so the ledger stays a pure projection of its sources.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::calculation::round_to_cents;
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollLineItem, PayrollSource, RECONCILIATION_TOLERANCE};
use crate::projection::PayrollLineItemProjector;
use crate::store::PayrollStore;

/// An edit to a trip-sourced ledger line.
///
/// Every field is optional; unset fields keep their current value. When a
/// total is supplied it must agree with the edited component sum within one
/// cent, otherwise the edit is rejected whole. When no total is supplied it
/// is re-derived from the components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripLineEdit {
    /// New base pay.
    pub base_pay: Option<Decimal>,
    /// New mileage pay.
    pub mileage_pay: Option<Decimal>,
    /// New drop-and-hook bucket amount.
    pub drop_and_hook_pay: Option<Decimal>,
    /// New chain-up bucket amount.
    pub chain_up_pay: Option<Decimal>,
    /// New wait-time bucket amount.
    pub wait_time_pay: Option<Decimal>,
    /// New unattributed accessorial amount.
    pub other_accessorial_pay: Option<Decimal>,
    /// New bonus.
    pub bonus_pay: Option<Decimal>,
    /// New deductions.
    pub deductions: Option<Decimal>,
    /// New total, checked against the component sum.
    pub total_gross_pay: Option<Decimal>,
    /// Corrected driver display name, written back to the trip.
    pub driver_name: Option<String>,
    /// Corrected origin terminal, written back to the trip.
    pub origin_terminal: Option<String>,
    /// Corrected destination terminal, written back to the trip.
    pub destination_terminal: Option<String>,
    /// Corrected trip miles, written back to the trip.
    pub miles: Option<Decimal>,
}

/// An edit to a cut-sourced ledger line. Cut lines carry only an aggregate
/// total and notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CutLineEdit {
    /// New total pay.
    pub total_pay: Option<Decimal>,
    /// New notes.
    pub notes: Option<String>,
}

/// An edit payload, shaped for one source kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemEdit {
    /// Applies to trip-sourced lines.
    Trip(TripLineEdit),
    /// Applies to cut-sourced lines.
    Cut(CutLineEdit),
}

/// Applies ledger edits by writing through to source records.
pub struct LedgerEditor {
    store: Arc<dyn PayrollStore>,
    projector: PayrollLineItemProjector,
}

impl LedgerEditor {
    /// Creates an editor over the given store.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        let projector = PayrollLineItemProjector::new(Arc::clone(&store), settings);
        LedgerEditor { store, projector }
    }

    /// Applies an edit to a ledger line and returns the re-projected line.
    ///
    /// The edit payload's kind must match the line's source kind. Period
    /// guards run inside the store's write section, so an edit against a
    /// locked period fails with no partial change.
    pub fn edit(&self, line_item_id: Uuid, edit: LineItemEdit) -> EngineResult<PayrollLineItem> {
        let line = self.store.get_line_item(line_item_id)?;
        match (line.source, edit) {
            (PayrollSource::TripSourced(trip_pay_id), LineItemEdit::Trip(edit)) => {
                self.edit_trip_line(&line, trip_pay_id, edit)
            }
            (PayrollSource::CutSourced(cut_pay_id), LineItemEdit::Cut(edit)) => {
                self.edit_cut_line(cut_pay_id, edit)
            }
            (PayrollSource::TripSourced(_), LineItemEdit::Cut(_)) => {
                Err(EngineError::EditNotApplicable {
                    line_item_id,
                    message: "cut-shaped edit against a trip-sourced line".to_string(),
                })
            }
            (PayrollSource::CutSourced(_), LineItemEdit::Trip(_)) => {
                Err(EngineError::EditNotApplicable {
                    line_item_id,
                    message: "trip-shaped edit against a cut-sourced line".to_string(),
                })
            }
        }
    }

    fn edit_trip_line(
        &self,
        line: &PayrollLineItem,
        trip_pay_id: Uuid,
        edit: TripLineEdit,
    ) -> EngineResult<PayrollLineItem> {
        let mut pay = self.store.get_trip_pay(trip_pay_id)?;

        let base = round_to_cents(edit.base_pay.unwrap_or(pay.base_pay));
        let mileage = round_to_cents(edit.mileage_pay.unwrap_or(pay.mileage_pay));
        let drop_and_hook =
            round_to_cents(edit.drop_and_hook_pay.unwrap_or(line.drop_and_hook_pay));
        let chain_up = round_to_cents(edit.chain_up_pay.unwrap_or(line.chain_up_pay));
        let wait_time = round_to_cents(edit.wait_time_pay.unwrap_or(line.wait_time_pay));
        let other = round_to_cents(
            edit.other_accessorial_pay
                .unwrap_or(line.other_accessorial_pay),
        );
        let bonus = round_to_cents(edit.bonus_pay.unwrap_or(pay.bonus));
        let deductions = round_to_cents(edit.deductions.unwrap_or(pay.deductions));

        let accessorial = drop_and_hook + chain_up + wait_time + other;
        let component_sum = base + mileage + accessorial + bonus - deductions;
        let total = match edit.total_gross_pay {
            Some(stated) => {
                let stated = round_to_cents(stated);
                let tolerance = Decimal::from_str(RECONCILIATION_TOLERANCE).unwrap();
                if (component_sum - stated).abs() > tolerance {
                    return Err(EngineError::ReconciliationViolation {
                        component_sum,
                        stated_total: stated,
                    });
                }
                stated
            }
            None => component_sum,
        };

        pay.base_pay = base;
        pay.mileage_pay = mileage;
        pay.accessorial_pay = accessorial;
        pay.bonus = bonus;
        pay.deductions = deductions;
        pay.total_gross_pay = total;
        pay.updated_at = Utc::now();
        self.store.update_trip_pay(pay.clone())?;

        let trip_changed = edit.driver_name.is_some()
            || edit.origin_terminal.is_some()
            || edit.destination_terminal.is_some()
            || edit.miles.is_some();
        if trip_changed {
            let mut trip = self.store.get_trip(pay.trip_id)?;
            if let Some(name) = edit.driver_name {
                trip.driver_name = name;
            }
            if let Some(origin) = edit.origin_terminal {
                trip.origin_terminal = origin;
            }
            if let Some(destination) = edit.destination_terminal {
                trip.destination_terminal = destination;
            }
            if let Some(miles) = edit.miles {
                trip.miles = miles;
            }
            self.store.update_trip(trip)?;
        }

        // Re-projection re-derives the bucket decomposition from trip-report
        // counts, which would discard a reviewer's redistribution. Write the
        // resolved bucket values onto the line so they stick.
        let mut updated = self.projector.project_from_trip_pay(trip_pay_id)?;
        updated.drop_and_hook_pay = drop_and_hook;
        updated.chain_up_pay = chain_up;
        updated.wait_time_pay = wait_time;
        updated.other_accessorial_pay = other;
        updated.updated_at = Utc::now();
        self.store.update_line_item(updated.clone())?;

        info!(line_item_id = %line.id, trip_pay_id = %trip_pay_id, "Trip line edited");
        Ok(updated)
    }

    fn edit_cut_line(&self, cut_pay_id: Uuid, edit: CutLineEdit) -> EngineResult<PayrollLineItem> {
        let mut request = self.store.get_cut_pay(cut_pay_id)?;
        if let Some(total) = edit.total_pay {
            request.total_pay = round_to_cents(total);
        }
        if let Some(notes) = edit.notes {
            request.notes = Some(notes);
        }
        request.updated_at = Utc::now();
        self.store.update_cut_pay(request.clone())?;

        info!(cut_pay_id = %cut_pay_id, "Cut line edited");
        self.projector.project_from_cut_pay(cut_pay_id)
    }
}
