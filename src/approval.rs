//! Bulk approval of heterogeneous ledger batches.
//!
//! A batch mixes trip-sourced and cut-sourced items. Each item is processed
//! independently: one failure never aborts the batch, and items are worked
//! in small fixed-size chunks so a mid-batch failure loses no prior
//! progress.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::models::{CutPayStatus, PayrollSourceType, TripPayStatus};
use crate::projection::PayrollLineItemProjector;
use crate::store::PayrollStore;

/// One item in an approval batch, referencing a source record by id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApprovalItem {
    /// Whether the id names a trip pay record or a cut pay request.
    pub source_type: PayrollSourceType,
    /// The source record id.
    pub id: Uuid,
}

/// Why an item in a batch was not approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalFailureReason {
    /// The item's status is not eligible for approval.
    NotApprovable,
    /// The item's pay period no longer permits line mutation.
    PeriodLocked,
    /// No source record exists with the given id.
    NotFound,
}

/// A per-item failure report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalFailure {
    /// The source record id.
    pub id: Uuid,
    /// Why the item failed.
    pub reason: ApprovalFailureReason,
}

/// The outcome of a bulk approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkApprovalOutcome {
    /// How many items were approved.
    pub approved_count: usize,
    /// The items that were not, with reasons.
    pub failures: Vec<ApprovalFailure>,
}

/// Approves batches of ledger lines with per-item accounting.
pub struct BulkApprovalCoordinator {
    store: Arc<dyn PayrollStore>,
    projector: PayrollLineItemProjector,
    chunk_size: usize,
}

impl BulkApprovalCoordinator {
    /// Creates a coordinator over the given store.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        let projector = PayrollLineItemProjector::new(Arc::clone(&store), settings.clone());
        BulkApprovalCoordinator {
            store,
            projector,
            chunk_size: settings.approval_chunk_size.max(1),
        }
    }

    /// Approves a batch of items on behalf of `approver`.
    ///
    /// Trip-sourced items are approvable from Pending, Calculated, or
    /// Reviewed; cut-sourced items only from Pending. Everything else is
    /// reported as a failure and the batch continues.
    pub fn approve(&self, items: &[ApprovalItem], approver: &str) -> BulkApprovalOutcome {
        let mut outcome = BulkApprovalOutcome {
            approved_count: 0,
            failures: Vec::new(),
        };

        for chunk in items.chunks(self.chunk_size) {
            for item in chunk {
                match self.approve_one(*item, approver) {
                    Ok(()) => outcome.approved_count += 1,
                    Err(reason) => {
                        warn!(id = %item.id, ?reason, "Approval item failed");
                        outcome.failures.push(ApprovalFailure {
                            id: item.id,
                            reason,
                        });
                    }
                }
            }
        }

        info!(
            approved = outcome.approved_count,
            failed = outcome.failures.len(),
            "Bulk approval processed"
        );
        outcome
    }

    /// Approves a single item. The bulk path funnels through here so both
    /// endpoints share eligibility rules.
    pub fn approve_one(
        &self,
        item: ApprovalItem,
        approver: &str,
    ) -> Result<(), ApprovalFailureReason> {
        match item.source_type {
            PayrollSourceType::TripPay => self.approve_trip_pay(item.id, approver),
            PayrollSourceType::CutPay => self.approve_cut_pay(item.id, approver),
        }
    }

    fn approve_trip_pay(&self, id: Uuid, approver: &str) -> Result<(), ApprovalFailureReason> {
        let mut pay = self
            .store
            .get_trip_pay(id)
            .map_err(|_| ApprovalFailureReason::NotFound)?;

        let period = self
            .store
            .get_pay_period(pay.pay_period_id)
            .map_err(|_| ApprovalFailureReason::NotFound)?;
        if !period.allows_line_mutation() {
            return Err(ApprovalFailureReason::PeriodLocked);
        }
        if !pay.status.is_approvable() {
            return Err(ApprovalFailureReason::NotApprovable);
        }

        let now = Utc::now();
        pay.status = TripPayStatus::Approved;
        pay.approved_at = Some(now);
        pay.approved_by = Some(approver.to_string());
        pay.updated_at = now;

        // The guard re-runs inside the store's write section.
        self.store
            .update_trip_pay(pay.clone())
            .map_err(|_| ApprovalFailureReason::PeriodLocked)?;
        self.projector
            .project_from_trip_pay(pay.id)
            .map_err(|_| ApprovalFailureReason::NotFound)?;
        Ok(())
    }

    fn approve_cut_pay(&self, id: Uuid, approver: &str) -> Result<(), ApprovalFailureReason> {
        let mut request = self
            .store
            .get_cut_pay(id)
            .map_err(|_| ApprovalFailureReason::NotFound)?;

        if let Some(period) = self.store.find_period_covering(request.requested_date) {
            if !period.allows_line_mutation() {
                return Err(ApprovalFailureReason::PeriodLocked);
            }
        }
        if !request.status.is_approvable() {
            return Err(ApprovalFailureReason::NotApprovable);
        }

        let now = Utc::now();
        request.status = CutPayStatus::Approved;
        request.approved_at = Some(now);
        request.approved_by = Some(approver.to_string());
        request.updated_at = now;

        self.store
            .update_cut_pay(request.clone())
            .map_err(|_| ApprovalFailureReason::NotFound)?;
        self.projector
            .project_from_cut_pay(request.id)
            .map_err(|_| ApprovalFailureReason::NotFound)?;
        Ok(())
    }
}
