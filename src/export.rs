//! Flattened payroll extract for the downstream payroll system.
//!
//! Rows are a denormalized snapshot of ledger lines for a date range.
//! Exporting stamps `exported_at` on each line the first time it is
//! included; re-running an extract never disturbs the original stamp.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{PayrollLineItemStatus, PayrollSourceType};
use crate::store::{LineItemFilter, PayrollStore};

/// One flattened extract row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRow {
    /// The ledger line id.
    pub line_item_id: Uuid,
    /// The kind of source record behind the line.
    pub source_type: PayrollSourceType,
    /// Driver display name.
    pub driver_name: String,
    /// Work date.
    pub work_date: NaiveDate,
    /// Origin terminal code.
    pub origin_terminal: String,
    /// Destination terminal code.
    pub destination_terminal: String,
    /// Trip miles.
    pub miles: Decimal,
    /// Base pay component.
    pub base_pay: Decimal,
    /// Mileage pay component.
    pub mileage_pay: Decimal,
    /// Drop-and-hook bucket.
    pub drop_and_hook_pay: Decimal,
    /// Chain-up bucket.
    pub chain_up_pay: Decimal,
    /// Wait-time bucket.
    pub wait_time_pay: Decimal,
    /// Unattributed accessorial amount.
    pub other_accessorial_pay: Decimal,
    /// Bonus component.
    pub bonus_pay: Decimal,
    /// Deductions.
    pub deductions: Decimal,
    /// The authoritative total.
    pub total_gross_pay: Decimal,
    /// Line status at extract time.
    pub status: PayrollLineItemStatus,
    /// Who approved the line's source, if approved.
    pub approved_by: Option<String>,
    /// When the source was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the line was first exported.
    pub exported_at: Option<DateTime<Utc>>,
}

/// Produces payroll extracts and stamps export timestamps.
pub struct ExportCoordinator {
    store: Arc<dyn PayrollStore>,
}

impl ExportCoordinator {
    /// Creates a coordinator over the given store.
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        ExportCoordinator { store }
    }

    /// Returns flattened rows for every ledger line matching the filter.
    ///
    /// Lines included for the first time get `exported_at` stamped with the
    /// extract time. Lines already carrying a stamp keep it, so repeated
    /// extracts are safe.
    pub fn export_line_items(&self, filter: &LineItemFilter) -> EngineResult<Vec<ExportRow>> {
        let lines = self.store.list_line_items(filter);
        let now = Utc::now();
        let mut rows = Vec::with_capacity(lines.len());

        for line in lines {
            let line = self.store.stamp_line_exported(line.id, now)?;
            rows.push(ExportRow {
                line_item_id: line.id,
                source_type: line.source.source_type(),
                driver_name: line.driver_name,
                work_date: line.work_date,
                origin_terminal: line.origin_terminal,
                destination_terminal: line.destination_terminal,
                miles: line.miles,
                base_pay: line.base_pay,
                mileage_pay: line.mileage_pay,
                drop_and_hook_pay: line.drop_and_hook_pay,
                chain_up_pay: line.chain_up_pay,
                wait_time_pay: line.wait_time_pay,
                other_accessorial_pay: line.other_accessorial_pay,
                bonus_pay: line.bonus_pay,
                deductions: line.deductions,
                total_gross_pay: line.total_gross_pay,
                status: line.status,
                approved_by: line.approved_by,
                approved_at: line.approved_at,
                exported_at: line.exported_at,
            });
        }

        info!(rows = rows.len(), "Payroll extract produced");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{CutPayEvaluator, CutPaySubmission};
    use crate::config::EngineSettings;
    use crate::models::{CutPayType, PayrollSource, TrailerConfig};
    use crate::store::MemoryStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn seed_cut_line(store: &Arc<MemoryStore>, driver: &str, date: NaiveDate) -> Uuid {
        let evaluator = CutPayEvaluator::new(
            Arc::clone(store) as Arc<dyn PayrollStore>,
            EngineSettings::default(),
        );
        let request = evaluator
            .evaluate(CutPaySubmission {
                driver_id: Uuid::new_v4(),
                driver_name: driver.to_string(),
                trip_id: None,
                request_type: CutPayType::Hours,
                quantity: dec("2"),
                trailer_config: TrailerConfig::Single,
                rate_override: Some(dec("25.00")),
                requested_date: date,
                notes: None,
            })
            .unwrap();
        store
            .find_line_item_by_source(PayrollSource::CutSourced(request.id))
            .unwrap()
            .id
    }

    /// EX-001: extract flattens matching lines into rows
    #[test]
    fn test_extract_flattens_lines() {
        let store = Arc::new(MemoryStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();
        seed_cut_line(&store, "K. Ibarra", date);
        seed_cut_line(&store, "D. Chen", date);

        let rows = ExportCoordinator::new(Arc::clone(&store) as Arc<dyn PayrollStore>)
            .export_line_items(&LineItemFilter::default())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.total_gross_pay == dec("50.00")));
        assert!(rows.iter().all(|r| r.exported_at.is_some()));
    }

    /// EX-002: the first extract stamps exported_at, re-runs keep it
    #[test]
    fn test_repeated_extract_keeps_first_stamp() {
        let store = Arc::new(MemoryStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();
        let line_id = seed_cut_line(&store, "K. Ibarra", date);

        let coordinator = ExportCoordinator::new(Arc::clone(&store) as Arc<dyn PayrollStore>);
        coordinator
            .export_line_items(&LineItemFilter::default())
            .unwrap();
        let first_stamp = store.get_line_item(line_id).unwrap().exported_at.unwrap();

        let rows = coordinator
            .export_line_items(&LineItemFilter::default())
            .unwrap();
        assert_eq!(rows[0].exported_at, Some(first_stamp));
        assert_eq!(
            store.get_line_item(line_id).unwrap().exported_at,
            Some(first_stamp)
        );
    }

    /// EX-003: filters narrow the extract
    #[test]
    fn test_filtered_extract() {
        let store = Arc::new(MemoryStore::new());
        seed_cut_line(
            &store,
            "K. Ibarra",
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        );
        seed_cut_line(
            &store,
            "D. Chen",
            NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
        );

        let filter = LineItemFilter {
            date_to: Some(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()),
            ..Default::default()
        };
        let rows = ExportCoordinator::new(Arc::clone(&store) as Arc<dyn PayrollStore>)
            .export_line_items(&filter)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].driver_name, "K. Ibarra");
    }
}
