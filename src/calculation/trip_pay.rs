//! The trip pay calculator.
//!
//! Orchestrates rate resolution and accessorial pricing to produce a full
//! pay breakdown for one trip, persists it, and projects the unified ledger
//! line. Safe to invoke repeatedly for the same trip: duplicate
//! trip-arrival triggers find the existing record and resynchronize it
//! instead of creating a duplicate.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{RateCard, RateMethod, TrailerConfig, Trip, TripPay, TripPayStatus};
use crate::projection::PayrollLineItemProjector;
use crate::store::PayrollStore;

use super::{RateContext, price_accessorials, resolve_rate_card, round_to_cents};

/// The result of a trip pay calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationOutcome {
    /// Whether a new trip pay record was created (false on recalculation).
    pub created: bool,
    /// The trip pay record id.
    pub trip_pay_id: Uuid,
    /// The status after calculation: `Calculated` when a rate card
    /// resolved, `Pending` when none matched.
    pub status: TripPayStatus,
}

/// Calculates trip pay and keeps the ledger projection in sync.
pub struct TripPayCalculator {
    store: Arc<dyn PayrollStore>,
    projector: PayrollLineItemProjector,
}

impl TripPayCalculator {
    /// Creates a calculator over the given store.
    pub fn new(store: Arc<dyn PayrollStore>, settings: EngineSettings) -> Self {
        let projector = PayrollLineItemProjector::new(Arc::clone(&store), settings);
        TripPayCalculator { store, projector }
    }

    /// Calculates (or recalculates) pay for a trip.
    ///
    /// Idempotent: a prior successful call for the same trip mutates the
    /// existing record and refreshes its ledger line. Fails with
    /// `MissingPrerequisite` when the trip has no driver or linehaul
    /// profile, and with `InvalidLifecycleTransition` when the covering pay
    /// period does not permit the write.
    pub fn calculate(&self, trip_id: Uuid) -> EngineResult<CalculationOutcome> {
        let trip = self.store.get_trip(trip_id)?;

        let driver_id = trip.driver_id.ok_or_else(|| EngineError::MissingPrerequisite {
            trip_id,
            field: "driver".to_string(),
        })?;
        if trip.linehaul_profile_id.is_none() {
            return Err(EngineError::MissingPrerequisite {
                trip_id,
                field: "linehaul profile".to_string(),
            });
        }

        let dispatch_date = trip.dispatch_time.date_naive();
        let period = self.store.ensure_period_for(dispatch_date);

        let trailer_config = TrailerConfig::from_trailer_count(trip.trailer_count);
        let cards = self.store.list_rate_cards();
        let context = RateContext::for_trip(&trip);
        let card = resolve_rate_card(&context, &cards);

        let (base_pay, mileage_pay, accessorial_pay) = match card {
            Some(card) => {
                let (base, mileage) = compute_base_and_mileage(card, &trip, trailer_config);
                let accessorial = price_accessorials(&trip.delays, card);
                (base, mileage, accessorial)
            }
            None => {
                warn!(
                    trip_id = %trip_id,
                    trip_number = %trip.trip_number,
                    "No rate card matched; trip pay left pending for manual rate"
                );
                (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
            }
        };

        // Reviewer adjustments and review/approval progress survive
        // recalculation; only the computed amounts are replaced.
        let existing = self.store.find_trip_pay_by_trip(trip_id);
        let (bonus, deductions) = existing
            .as_ref()
            .map(|p| (p.bonus, p.deductions))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        let total_gross_pay =
            round_to_cents(base_pay + mileage_pay + accessorial_pay + bonus - deductions);

        let status = match (&existing, card) {
            (Some(p), _) if !p.status.is_approvable() => p.status,
            (Some(p), _) if p.status == TripPayStatus::Reviewed => p.status,
            (_, Some(_)) => TripPayStatus::Calculated,
            (_, None) => TripPayStatus::Pending,
        };

        let now = Utc::now();
        let pay = TripPay {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            pay_period_id: period.id,
            base_pay,
            mileage_pay,
            accessorial_pay,
            bonus,
            deductions,
            total_gross_pay,
            status,
            rate_card_id: card.map(|c| c.id),
            calculated_at: Some(now),
            reviewed_at: existing.as_ref().and_then(|p| p.reviewed_at),
            approved_at: existing.as_ref().and_then(|p| p.approved_at),
            approved_by: existing.as_ref().and_then(|p| p.approved_by.clone()),
            paid_at: existing.as_ref().and_then(|p| p.paid_at),
            created_at: now,
            updated_at: now,
        };

        let (created, stored) = self.store.upsert_trip_pay(pay)?;
        self.projector.project_from_trip_pay(stored.id)?;

        info!(
            trip_id = %trip_id,
            trip_pay_id = %stored.id,
            created,
            status = ?stored.status,
            total_gross_pay = %stored.total_gross_pay,
            "Trip pay calculated"
        );

        Ok(CalculationOutcome {
            created,
            trip_pay_id: stored.id,
            status: stored.status,
        })
    }
}

/// Computes base and mileage pay from a resolved card.
///
/// Precedence: a flat per-trip amount, then an equipment-specific per-mile
/// rate for the trip's trailer configuration, then the card's legacy
/// method/amount pair. A minimum-amount shortfall raises mileage pay, never
/// base pay; a maximum-amount excess is taken out of mileage first.
fn compute_base_and_mileage(
    card: &RateCard,
    trip: &Trip,
    trailer_config: TrailerConfig,
) -> (Decimal, Decimal) {
    let (mut base, mut mileage) = if let Some(flat) = card.flat_trip_amount {
        (flat, Decimal::ZERO)
    } else if let Some(mile_rate) = card.mile_rate_for(trailer_config) {
        (Decimal::ZERO, trip.miles * mile_rate)
    } else {
        match card.method {
            RateMethod::PerMile => (Decimal::ZERO, trip.miles * card.rate_amount),
            RateMethod::FlatRate => (card.rate_amount, Decimal::ZERO),
            RateMethod::Hourly => (trip.transit_hours * card.rate_amount, Decimal::ZERO),
            // Percentage cards need a revenue basis the engine does not
            // carry; they price to zero and surface as pending review.
            RateMethod::Percentage => (Decimal::ZERO, Decimal::ZERO),
        }
    };

    base = round_to_cents(base);
    mileage = round_to_cents(mileage);

    if let Some(minimum) = card.minimum_amount {
        if base + mileage < minimum {
            mileage = minimum - base;
        }
    }
    if let Some(maximum) = card.maximum_amount {
        let excess = base + mileage - maximum;
        if excess > Decimal::ZERO {
            mileage -= excess;
            if mileage < Decimal::ZERO {
                base += mileage;
                mileage = Decimal::ZERO;
            }
        }
    }

    (base, mileage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PayrollSource, RateScope};
    use crate::store::{LineItemFilter, MemoryStore};
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn trip(miles: &str, trailer_count: u32) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            trip_number: "T-1001".to_string(),
            driver_id: Some(Uuid::new_v4()),
            driver_name: "J. Moreno".to_string(),
            carrier_id: Some(Uuid::new_v4()),
            linehaul_profile_id: Some(Uuid::new_v4()),
            route_id: None,
            origin_terminal: "PDX".to_string(),
            destination_terminal: "SEA".to_string(),
            dispatch_time: Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
            arrival_time: None,
            miles: dec(miles),
            transit_hours: dec("4.5"),
            trailer_count,
            fuel_cost: dec("180.00"),
            delays: vec![],
        }
    }

    fn default_card() -> RateCard {
        RateCard::new(RateScope::Default, None, RateMethod::PerMile, dec("0.58"))
    }

    /// TP-001: flat trip amount beats mile rates
    #[test]
    fn test_flat_trip_amount_takes_precedence() {
        let mut card = default_card();
        card.flat_trip_amount = Some(dec("400.00"));
        card.single_mile_rate = Some(dec("0.60"));

        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("200", 1), TrailerConfig::Single);
        assert_eq!(base, dec("400.00"));
        assert_eq!(mileage, dec("0.00"));
    }

    /// TP-002: triple-trailer mile rate with no flat amount
    #[test]
    fn test_triple_mile_rate_pays_mileage_only() {
        let mut card = default_card();
        card.triple_mile_rate = Some(dec("2.10"));

        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("150", 3), TrailerConfig::Triple);
        assert_eq!(base, dec("0.00"));
        assert_eq!(mileage, dec("315.00"));
    }

    /// TP-003: legacy per-mile fallback when no config rate is defined
    #[test]
    fn test_legacy_per_mile_fallback() {
        let card = default_card();
        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("182", 2), TrailerConfig::Double);
        assert_eq!(base, dec("0.00"));
        assert_eq!(mileage, dec("105.56"));
    }

    /// TP-004: hourly fallback uses transit hours
    #[test]
    fn test_legacy_hourly_fallback() {
        let mut card = default_card();
        card.method = RateMethod::Hourly;
        card.rate_amount = dec("32.00");

        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("100", 1), TrailerConfig::Single);
        assert_eq!(base, dec("144.00"));
        assert_eq!(mileage, dec("0.00"));
    }

    /// TP-005: minimum amount raises mileage, never base
    #[test]
    fn test_minimum_raises_mileage_only() {
        let mut card = default_card();
        card.method = RateMethod::FlatRate;
        card.rate_amount = dec("100.00");
        card.minimum_amount = Some(dec("500.00"));

        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("0", 1), TrailerConfig::Single);
        assert_eq!(base, dec("100.00"));
        assert_eq!(mileage, dec("400.00"));
        assert_eq!(base + mileage, dec("500.00"));
    }

    /// TP-006: maximum amount is taken out of mileage first
    #[test]
    fn test_maximum_caps_sum() {
        let mut card = default_card();
        card.maximum_amount = Some(dec("100.00"));

        let (base, mileage) =
            compute_base_and_mileage(&card, &trip("300", 1), TrailerConfig::Single);
        assert_eq!(base, dec("0.00"));
        assert_eq!(mileage, dec("100.00"));
    }

    fn calculator_with(store: Arc<MemoryStore>) -> TripPayCalculator {
        TripPayCalculator::new(store, EngineSettings::default())
    }

    /// TP-007: calculating twice produces one trip pay and one ledger line
    #[test]
    fn test_calculate_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rate_card(default_card());
        let trip = trip("182", 1);
        let trip_id = trip.id;
        store.insert_trip(trip);

        let calculator = calculator_with(Arc::clone(&store));
        let first = calculator.calculate(trip_id).unwrap();
        let second = calculator.calculate(trip_id).unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.trip_pay_id, second.trip_pay_id);

        let lines = store.list_line_items(&LineItemFilter::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].source,
            PayrollSource::TripSourced(first.trip_pay_id)
        );
    }

    /// TP-008: no matching card leaves the record pending
    #[test]
    fn test_no_card_leaves_pending() {
        let store = Arc::new(MemoryStore::new());
        let trip = trip("182", 1);
        let trip_id = trip.id;
        store.insert_trip(trip);

        let outcome = calculator_with(Arc::clone(&store)).calculate(trip_id).unwrap();
        assert_eq!(outcome.status, TripPayStatus::Pending);

        let pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        assert_eq!(pay.rate_card_id, None);
        assert_eq!(pay.total_gross_pay, Decimal::ZERO);
    }

    /// TP-009: missing driver aborts with a descriptive failure
    #[test]
    fn test_missing_driver_aborts() {
        let store = Arc::new(MemoryStore::new());
        let mut trip = trip("182", 1);
        trip.driver_id = None;
        let trip_id = trip.id;
        store.insert_trip(trip);

        let result = calculator_with(store).calculate(trip_id);
        assert!(matches!(
            result,
            Err(EngineError::MissingPrerequisite { field, .. }) if field == "driver"
        ));
    }

    /// TP-010: totals reconcile from components
    #[test]
    fn test_total_reconciles_from_components() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rate_card(default_card());
        let trip = trip("182", 1);
        let trip_id = trip.id;
        store.insert_trip(trip);

        let outcome = calculator_with(Arc::clone(&store)).calculate(trip_id).unwrap();
        let pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        assert_eq!(
            pay.total_gross_pay,
            pay.base_pay + pay.mileage_pay + pay.accessorial_pay + pay.bonus - pay.deductions
        );
    }

    /// TP-011: bonus and deductions survive recalculation
    #[test]
    fn test_recalculation_preserves_adjustments() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rate_card(default_card());
        let trip = trip("182", 1);
        let trip_id = trip.id;
        store.insert_trip(trip);

        let calculator = calculator_with(Arc::clone(&store));
        let outcome = calculator.calculate(trip_id).unwrap();

        let mut pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        pay.bonus = dec("50.00");
        store.update_trip_pay(pay).unwrap();

        calculator.calculate(trip_id).unwrap();
        let pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        assert_eq!(pay.bonus, dec("50.00"));
        assert_eq!(pay.total_gross_pay, dec("155.56"));
    }

    /// TP-012: a reviewed record keeps its status and review timestamp
    /// through recalculation
    #[test]
    fn test_recalculation_preserves_reviewed_status() {
        let store = Arc::new(MemoryStore::new());
        store.insert_rate_card(default_card());
        let trip = trip("182", 1);
        let trip_id = trip.id;
        store.insert_trip(trip);

        let calculator = calculator_with(Arc::clone(&store));
        let outcome = calculator.calculate(trip_id).unwrap();

        let reviewed_at = Utc::now();
        let mut pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        pay.status = TripPayStatus::Reviewed;
        pay.reviewed_at = Some(reviewed_at);
        store.update_trip_pay(pay).unwrap();

        let outcome = calculator.calculate(trip_id).unwrap();
        assert_eq!(outcome.status, TripPayStatus::Reviewed);

        let pay = store.get_trip_pay(outcome.trip_pay_id).unwrap();
        assert_eq!(pay.status, TripPayStatus::Reviewed);
        assert_eq!(pay.reviewed_at, Some(reviewed_at));
    }
}
