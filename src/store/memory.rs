//! In-memory implementation of [`PayrollStore`].
//!
//! All tables live behind one `RwLock`, so every mutation is a single
//! atomic section. That is what lets the lifecycle guards run "in the same
//! transaction" as the write they protect.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CutPayRequest, PayPeriod, PayrollLineItem, PayrollSource, RateCard, Trip, TripPay, TripReport,
};

use super::{LineItemFilter, PayrollStore};

#[derive(Default)]
struct Tables {
    rate_cards: HashMap<Uuid, RateCard>,
    trips: HashMap<Uuid, Trip>,
    trip_reports: HashMap<Uuid, TripReport>,
    trip_pays: HashMap<Uuid, TripPay>,
    cut_pays: HashMap<Uuid, CutPayRequest>,
    line_items: HashMap<Uuid, PayrollLineItem>,
    pay_periods: HashMap<Uuid, PayPeriod>,
}

impl Tables {
    fn period_allows_line_mutation(
        &self,
        period_id: Uuid,
        attempted: &str,
    ) -> EngineResult<()> {
        let period = self
            .pay_periods
            .get(&period_id)
            .ok_or(EngineError::PayPeriodNotFound { period_id })?;
        if !period.allows_line_mutation() {
            return Err(EngineError::InvalidLifecycleTransition {
                from: period.status,
                attempted: attempted.to_string(),
            });
        }
        Ok(())
    }
}

/// An in-memory [`PayrollStore`] backed by hash-map tables.
///
/// Used directly in production for this engine (there is no external
/// database) and by unit tests as the injected fake.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayrollStore for MemoryStore {
    fn insert_rate_card(&self, card: RateCard) {
        let mut tables = self.inner.write().unwrap();
        tables.rate_cards.insert(card.id, card);
    }

    fn list_rate_cards(&self) -> Vec<RateCard> {
        let tables = self.inner.read().unwrap();
        tables.rate_cards.values().cloned().collect()
    }

    fn insert_trip(&self, trip: Trip) {
        let mut tables = self.inner.write().unwrap();
        tables.trips.insert(trip.id, trip);
    }

    fn get_trip(&self, trip_id: Uuid) -> EngineResult<Trip> {
        let tables = self.inner.read().unwrap();
        tables
            .trips
            .get(&trip_id)
            .cloned()
            .ok_or(EngineError::TripNotFound { trip_id })
    }

    fn update_trip(&self, trip: Trip) -> EngineResult<()> {
        let mut tables = self.inner.write().unwrap();
        let trip_id = trip.id;
        if !tables.trips.contains_key(&trip_id) {
            return Err(EngineError::TripNotFound { trip_id });
        }
        tables.trips.insert(trip_id, trip);
        Ok(())
    }

    fn put_trip_report(&self, report: TripReport) {
        let mut tables = self.inner.write().unwrap();
        tables.trip_reports.insert(report.trip_id, report);
    }

    fn get_trip_report(&self, trip_id: Uuid) -> Option<TripReport> {
        let tables = self.inner.read().unwrap();
        tables.trip_reports.get(&trip_id).cloned()
    }

    fn upsert_trip_pay(&self, mut pay: TripPay) -> EngineResult<(bool, TripPay)> {
        let mut tables = self.inner.write().unwrap();

        let period = tables
            .pay_periods
            .get(&pay.pay_period_id)
            .ok_or(EngineError::PayPeriodNotFound {
                period_id: pay.pay_period_id,
            })?
            .clone();

        // Unique by trip id: a second calculation mutates in place.
        let existing = tables
            .trip_pays
            .values()
            .find(|p| p.trip_id == pay.trip_id)
            .cloned();

        match existing {
            None => {
                if !period.allows_trip_pay_creation() {
                    return Err(EngineError::InvalidLifecycleTransition {
                        from: period.status,
                        attempted: "create trip pay".to_string(),
                    });
                }
                tables.trip_pays.insert(pay.id, pay.clone());
                Ok((true, pay))
            }
            Some(current) => {
                if !period.allows_line_mutation() {
                    return Err(EngineError::InvalidLifecycleTransition {
                        from: period.status,
                        attempted: "recalculate trip pay".to_string(),
                    });
                }
                pay.id = current.id;
                pay.created_at = current.created_at;
                tables.trip_pays.insert(pay.id, pay.clone());
                Ok((false, pay))
            }
        }
    }

    fn get_trip_pay(&self, trip_pay_id: Uuid) -> EngineResult<TripPay> {
        let tables = self.inner.read().unwrap();
        tables
            .trip_pays
            .get(&trip_pay_id)
            .cloned()
            .ok_or(EngineError::TripPayNotFound { trip_pay_id })
    }

    fn find_trip_pay_by_trip(&self, trip_id: Uuid) -> Option<TripPay> {
        let tables = self.inner.read().unwrap();
        tables
            .trip_pays
            .values()
            .find(|p| p.trip_id == trip_id)
            .cloned()
    }

    fn update_trip_pay(&self, pay: TripPay) -> EngineResult<()> {
        let mut tables = self.inner.write().unwrap();
        let trip_pay_id = pay.id;
        if !tables.trip_pays.contains_key(&trip_pay_id) {
            return Err(EngineError::TripPayNotFound { trip_pay_id });
        }
        tables.period_allows_line_mutation(pay.pay_period_id, "update trip pay")?;
        tables.trip_pays.insert(trip_pay_id, pay);
        Ok(())
    }

    fn insert_cut_pay(&self, request: CutPayRequest) {
        let mut tables = self.inner.write().unwrap();
        tables.cut_pays.insert(request.id, request);
    }

    fn get_cut_pay(&self, cut_pay_id: Uuid) -> EngineResult<CutPayRequest> {
        let tables = self.inner.read().unwrap();
        tables
            .cut_pays
            .get(&cut_pay_id)
            .cloned()
            .ok_or(EngineError::CutPayNotFound { cut_pay_id })
    }

    fn update_cut_pay(&self, request: CutPayRequest) -> EngineResult<()> {
        let mut tables = self.inner.write().unwrap();
        let cut_pay_id = request.id;
        if !tables.cut_pays.contains_key(&cut_pay_id) {
            return Err(EngineError::CutPayNotFound { cut_pay_id });
        }
        tables.cut_pays.insert(cut_pay_id, request);
        Ok(())
    }

    fn upsert_line_item(
        &self,
        mut item: PayrollLineItem,
    ) -> EngineResult<(bool, PayrollLineItem)> {
        let mut tables = self.inner.write().unwrap();

        let existing = tables
            .line_items
            .values()
            .find(|l| l.source == item.source)
            .cloned();

        match existing {
            None => {
                tables.line_items.insert(item.id, item.clone());
                Ok((true, item))
            }
            Some(current) => {
                if let Some(period_id) = item.pay_period_id {
                    tables.period_allows_line_mutation(period_id, "resync ledger line")?;
                }
                item.id = current.id;
                item.created_at = current.created_at;
                tables.line_items.insert(item.id, item.clone());
                Ok((false, item))
            }
        }
    }

    fn get_line_item(&self, line_item_id: Uuid) -> EngineResult<PayrollLineItem> {
        let tables = self.inner.read().unwrap();
        tables
            .line_items
            .get(&line_item_id)
            .cloned()
            .ok_or(EngineError::LineItemNotFound { line_item_id })
    }

    fn find_line_item_by_source(&self, source: PayrollSource) -> Option<PayrollLineItem> {
        let tables = self.inner.read().unwrap();
        tables
            .line_items
            .values()
            .find(|l| l.source == source)
            .cloned()
    }

    fn update_line_item(&self, item: PayrollLineItem) -> EngineResult<()> {
        let mut tables = self.inner.write().unwrap();
        let line_item_id = item.id;
        if !tables.line_items.contains_key(&line_item_id) {
            return Err(EngineError::LineItemNotFound { line_item_id });
        }
        if let Some(period_id) = item.pay_period_id {
            tables.period_allows_line_mutation(period_id, "edit ledger line")?;
        }
        tables.line_items.insert(line_item_id, item);
        Ok(())
    }

    fn stamp_line_exported(
        &self,
        line_item_id: Uuid,
        at: DateTime<Utc>,
    ) -> EngineResult<PayrollLineItem> {
        let mut tables = self.inner.write().unwrap();
        let item = tables
            .line_items
            .get_mut(&line_item_id)
            .ok_or(EngineError::LineItemNotFound { line_item_id })?;
        if item.exported_at.is_none() {
            item.exported_at = Some(at);
            item.updated_at = at;
        }
        Ok(item.clone())
    }

    fn list_line_items(&self, filter: &LineItemFilter) -> Vec<PayrollLineItem> {
        let tables = self.inner.read().unwrap();
        tables
            .line_items
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect()
    }

    fn insert_pay_period(&self, period: PayPeriod) {
        let mut tables = self.inner.write().unwrap();
        tables.pay_periods.insert(period.id, period);
    }

    fn get_pay_period(&self, period_id: Uuid) -> EngineResult<PayPeriod> {
        let tables = self.inner.read().unwrap();
        tables
            .pay_periods
            .get(&period_id)
            .cloned()
            .ok_or(EngineError::PayPeriodNotFound { period_id })
    }

    fn update_pay_period(&self, period: PayPeriod) -> EngineResult<()> {
        let mut tables = self.inner.write().unwrap();
        let period_id = period.id;
        if !tables.pay_periods.contains_key(&period_id) {
            return Err(EngineError::PayPeriodNotFound { period_id });
        }
        tables.pay_periods.insert(period_id, period);
        Ok(())
    }

    fn find_period_covering(&self, date: NaiveDate) -> Option<PayPeriod> {
        let tables = self.inner.read().unwrap();
        tables
            .pay_periods
            .values()
            .find(|p| p.contains_date(date))
            .cloned()
    }

    fn ensure_period_for(&self, date: NaiveDate) -> PayPeriod {
        let mut tables = self.inner.write().unwrap();
        if let Some(period) = tables.pay_periods.values().find(|p| p.contains_date(date)) {
            return period.clone();
        }
        let period = PayPeriod::covering_month_of(date);
        tables.pay_periods.insert(period.id, period.clone());
        period
    }
}
