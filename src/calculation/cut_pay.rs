//! The cut pay evaluator.
//!
//! Cut pay is manually requested, non-trip compensation, quantified in
//! hours or miles. The evaluator prices the request from the driver's
//! resolved rate card (or an explicit rate override), persists it, and
//! projects its ledger line.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::error::EngineResult;
use crate::models::{CutPayRequest, CutPayStatus, CutPayType, RateCard, RateMethod, TrailerConfig};
use crate::projection::PayrollLineItemProjector;
use crate::store::PayrollStore;

use super::{RateContext, resolve_rate_card, round_to_cents};

/// A cut pay submission from the request form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutPaySubmission {
    /// The requesting driver.
    pub driver_id: Uuid,
    /// Denormalized driver display name.
    pub driver_name: String,
    /// An associated trip, if any.
    pub trip_id: Option<Uuid>,
    /// Hours- or miles-based.
    pub request_type: CutPayType,
    /// The quantity requested.
    pub quantity: Decimal,
    /// Trailer configuration for per-mile pricing.
    pub trailer_config: TrailerConfig,
    /// Explicit rate, overriding rate card resolution.
    pub rate_override: Option<Decimal>,
    /// The date the requested work occurred.
    pub requested_date: NaiveDate,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Evaluates and records cut pay requests.
pub struct CutPayEvaluator {
    store: Arc<dyn PayrollStore>,
    projector: PayrollLineItemProjector,
}

impl CutPayEvaluator {
    /// Creates an evaluator over the given store.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        let projector = PayrollLineItemProjector::new(Arc::clone(&store), settings);
        CutPayEvaluator { store, projector }
    }

    /// Prices and records a cut pay request.
    ///
    /// The rate comes from the submission's override when present,
    /// otherwise from the driver's resolved rate card (hourly amount for
    /// hours requests, the configuration's per-mile rate for miles
    /// requests). A request with no determinable rate is recorded at zero
    /// and left pending for a reviewer to price manually.
    pub fn evaluate(&self, submission: CutPaySubmission) -> EngineResult<CutPayRequest> {
        let rate = match submission.rate_override {
            Some(rate) => rate,
            None => {
                let cards = self.store.list_rate_cards();
                let context = RateContext {
                    driver_id: Some(submission.driver_id),
                    carrier_id: None,
                    linehaul_profile_id: None,
                    route_id: None,
                    evaluation_date: submission.requested_date,
                };
                match resolve_rate_card(&context, &cards) {
                    Some(card) => {
                        derive_rate(card, submission.request_type, submission.trailer_config)
                            .unwrap_or_else(|| {
                                warn!(
                                    driver_id = %submission.driver_id,
                                    request_type = ?submission.request_type,
                                    "Resolved card defines no usable rate; cut pay priced at zero"
                                );
                                Decimal::ZERO
                            })
                    }
                    None => {
                        warn!(
                            driver_id = %submission.driver_id,
                            "No rate card matched; cut pay priced at zero"
                        );
                        Decimal::ZERO
                    }
                }
            }
        };

        let total_pay = round_to_cents(submission.quantity * rate);
        let now = Utc::now();
        let request = CutPayRequest {
            id: Uuid::new_v4(),
            driver_id: submission.driver_id,
            driver_name: submission.driver_name,
            trip_id: submission.trip_id,
            request_type: submission.request_type,
            quantity: submission.quantity,
            rate_applied: rate,
            trailer_config: submission.trailer_config,
            total_pay,
            status: CutPayStatus::Pending,
            approved_by: None,
            approved_at: None,
            notes: submission.notes,
            requested_date: submission.requested_date,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_cut_pay(request.clone());
        self.projector.project_from_cut_pay(request.id)?;

        info!(
            cut_pay_id = %request.id,
            driver_id = %request.driver_id,
            total_pay = %request.total_pay,
            "Cut pay request recorded"
        );

        Ok(request)
    }
}

/// Picks the rate a card offers for a cut pay request, if any.
fn derive_rate(
    card: &RateCard,
    request_type: CutPayType,
    trailer_config: TrailerConfig,
) -> Option<Decimal> {
    match request_type {
        CutPayType::Hours => match card.method {
            RateMethod::Hourly => Some(card.rate_amount),
            _ => None,
        },
        CutPayType::Miles => card.mile_rate_for(trailer_config).or(match card.method {
            RateMethod::PerMile => Some(card.rate_amount),
            _ => None,
        }),
    }
}
