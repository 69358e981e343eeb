//! Rate card resolution.
//!
//! Given a trip's context, selects the single applicable rate card by
//! specificity and priority. Scope types are evaluated in strict order
//! (driver, carrier, linehaul profile, origin/destination pair, default)
//! and resolution stops at the first scope with at least one active,
//! date-valid match. Within a scope the highest priority wins; ties break
//! by most recent effective date.
//!
//! No match is a valid outcome, not an error: the trip pay stays `Pending`
//! awaiting a manual rate assignment.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{RateCard, RateScope, Trip};

/// The evaluation context for rate card resolution.
#[derive(Debug, Clone)]
pub struct RateContext {
    /// The trip's driver.
    pub driver_id: Option<Uuid>,
    /// The trip's carrier.
    pub carrier_id: Option<Uuid>,
    /// The trip's linehaul profile.
    pub linehaul_profile_id: Option<Uuid>,
    /// The trip's origin/destination pair.
    pub route_id: Option<Uuid>,
    /// The date cards must be valid on, normally the dispatch date.
    pub evaluation_date: NaiveDate,
}

impl RateContext {
    /// Builds a context from a trip, evaluating on its dispatch date.
    pub fn for_trip(trip: &Trip) -> Self {
        RateContext {
            driver_id: trip.driver_id,
            carrier_id: trip.carrier_id,
            linehaul_profile_id: trip.linehaul_profile_id,
            route_id: trip.route_id,
            evaluation_date: trip.dispatch_time.date_naive(),
        }
    }

    /// The context reference a card of the given scope must match, if the
    /// context carries one.
    fn scope_ref(&self, scope: RateScope) -> Option<Uuid> {
        match scope {
            RateScope::Driver => self.driver_id,
            RateScope::Carrier => self.carrier_id,
            RateScope::LinehaulProfile => self.linehaul_profile_id,
            RateScope::OriginDestination => self.route_id,
            RateScope::Default => None,
        }
    }
}

/// Resolves the single applicable rate card for a context.
///
/// Returns `None` when no scope type yields a match.
///
/// # Example
///
/// ```
/// use linehaul_settlement::calculation::{RateContext, resolve_rate_card};
/// use linehaul_settlement::models::{RateCard, RateMethod, RateScope};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let cards = vec![RateCard::new(
///     RateScope::Default,
///     None,
///     RateMethod::PerMile,
///     Decimal::from_str("0.58").unwrap(),
/// )];
/// let context = RateContext {
///     driver_id: None,
///     carrier_id: None,
///     linehaul_profile_id: None,
///     route_id: None,
///     evaluation_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
/// };
/// assert!(resolve_rate_card(&context, &cards).is_some());
/// ```
pub fn resolve_rate_card<'a>(context: &RateContext, cards: &'a [RateCard]) -> Option<&'a RateCard> {
    for scope in RateScope::SPECIFICITY_ORDER {
        let candidates: Vec<&RateCard> = cards
            .iter()
            .filter(|card| card.scope == scope)
            .filter(|card| card.active)
            .filter(|card| card.is_effective_on(context.evaluation_date))
            .filter(|card| match scope {
                // A default card binds to no reference.
                RateScope::Default => true,
                _ => match context.scope_ref(scope) {
                    Some(context_ref) => card.scope_ref == Some(context_ref),
                    None => false,
                },
            })
            .collect();

        if let Some(winner) = candidates
            .into_iter()
            .max_by_key(|card| (card.priority, card.effective_date))
        {
            return Some(winner);
        }
    }
    None
}
