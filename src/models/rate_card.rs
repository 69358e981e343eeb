//! Rate card models and related types.
//!
//! A rate card is a versioned, scoped pay rule. Cards are scoped from most
//! specific (a single driver) to least specific (a system-wide default), and
//! each card may carry accessorial sub-rates for pricing operational
//! exceptions such as detention or breakdowns.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The scope a rate card applies to, ordered from most to least specific.
///
/// Resolution evaluates scopes in this exact order and stops at the first
/// scope with a matching card, so a driver-specific card always beats a
/// carrier-wide one regardless of priority values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScope {
    /// Applies to one specific driver.
    Driver,
    /// Applies to all drivers of one carrier.
    Carrier,
    /// Applies to trips running one linehaul profile.
    LinehaulProfile,
    /// Applies to trips between one origin/destination pair.
    OriginDestination,
    /// The system-wide fallback.
    Default,
}

impl RateScope {
    /// All scopes in strict specificity order, most specific first.
    pub const SPECIFICITY_ORDER: [RateScope; 5] = [
        RateScope::Driver,
        RateScope::Carrier,
        RateScope::LinehaulProfile,
        RateScope::OriginDestination,
        RateScope::Default,
    ];
}

/// The pricing method of a rate card or accessorial sub-rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMethod {
    /// Rate amount is applied per mile driven.
    PerMile,
    /// Rate amount is a flat charge.
    FlatRate,
    /// Rate amount is applied per hour.
    Hourly,
    /// Rate amount is a percentage (retained for legacy cards).
    Percentage,
}

/// The trailer configuration pulled on a trip.
///
/// Determined by counting assigned trailers and used to select the
/// equipment-specific per-mile rate on a card.
///
/// # Example
///
/// ```
/// use linehaul_settlement::models::TrailerConfig;
///
/// assert_eq!(TrailerConfig::from_trailer_count(0), TrailerConfig::Single);
/// assert_eq!(TrailerConfig::from_trailer_count(2), TrailerConfig::Double);
/// assert_eq!(TrailerConfig::from_trailer_count(5), TrailerConfig::Triple);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailerConfig {
    /// Zero or one trailer.
    Single,
    /// Two trailers.
    Double,
    /// Three or more trailers.
    Triple,
}

impl TrailerConfig {
    /// Derives the configuration from the number of assigned trailers.
    pub fn from_trailer_count(count: u32) -> Self {
        match count {
            0 | 1 => TrailerConfig::Single,
            2 => TrailerConfig::Double,
            _ => TrailerConfig::Triple,
        }
    }
}

/// The type of an accessorial charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorialType {
    /// Waiting at a shipper/consignee beyond free time.
    Detention,
    /// Equipment breakdown en route.
    Breakdown,
    /// Overnight layover away from domicile.
    Layover,
    /// Dropping and hooking trailers at an intermediate terminal.
    DropAndHook,
    /// Installing tire chains in chain-control conditions.
    ChainUp,
    /// General wait time.
    WaitTime,
    /// Anything not covered by a more specific type.
    Other,
}

/// An accessorial sub-rate belonging to exactly one rate card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorialRate {
    /// The type of exception this sub-rate prices.
    pub accessorial_type: AccessorialType,
    /// How the rate is applied (hourly rates multiply by delay duration,
    /// all other methods charge the rate flat).
    pub method: RateMethod,
    /// The rate amount.
    pub rate: Decimal,
    /// Optional lower clamp on the computed charge.
    pub minimum: Option<Decimal>,
    /// Optional upper clamp on the computed charge.
    pub maximum: Option<Decimal>,
}

impl AccessorialRate {
    /// Clamps a computed charge to this sub-rate's minimum/maximum bounds.
    pub fn clamp(&self, charge: Decimal) -> Decimal {
        let mut result = charge;
        if let Some(min) = self.minimum {
            if result < min {
                result = min;
            }
        }
        if let Some(max) = self.maximum {
            if result > max {
                result = max;
            }
        }
        result
    }
}

/// A versioned, scoped pay rule.
///
/// At most one rate card is the *resolved* card for a given trip at
/// calculation time; resolution is a pure function over the active card set,
/// not a stored relation.
///
/// # Example
///
/// ```
/// use linehaul_settlement::models::{RateCard, RateMethod, RateScope};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let card = RateCard::new(
///     RateScope::Default,
///     None,
///     RateMethod::PerMile,
///     Decimal::from_str("0.58").unwrap(),
/// );
/// assert!(card.is_effective_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    /// Unique identifier.
    pub id: Uuid,
    /// The scope type this card applies to.
    pub scope: RateScope,
    /// The specific driver/carrier/profile/OD-pair this card is bound to.
    /// `None` for `Default` scope.
    pub scope_ref: Option<Uuid>,
    /// Legacy pricing method, used when no flat trip amount or
    /// equipment-specific mile rate applies.
    pub method: RateMethod,
    /// Legacy rate amount paired with `method`.
    pub rate_amount: Decimal,
    /// Per-mile rate when pulling a single trailer.
    pub single_mile_rate: Option<Decimal>,
    /// Per-mile rate when pulling doubles.
    pub double_mile_rate: Option<Decimal>,
    /// Per-mile rate when pulling triples.
    pub triple_mile_rate: Option<Decimal>,
    /// Flat per-trip amount; takes precedence over all mile rates.
    pub flat_trip_amount: Option<Decimal>,
    /// Minimum base+mileage amount; shortfalls raise mileage pay.
    pub minimum_amount: Option<Decimal>,
    /// Maximum base+mileage amount.
    pub maximum_amount: Option<Decimal>,
    /// Higher priority wins within the same scope type.
    pub priority: i32,
    /// First date (inclusive) this card may be applied.
    pub effective_date: NaiveDate,
    /// Last date (inclusive) this card may be applied; `None` is open-ended.
    pub expiration_date: Option<NaiveDate>,
    /// Inactive cards are never selected.
    pub active: bool,
    /// Accessorial sub-rates belonging to this card.
    pub accessorials: Vec<AccessorialRate>,
}

impl RateCard {
    /// Creates an active card with the given scope and legacy rate, effective
    /// from the UNIX epoch with default priority and no clamps.
    pub fn new(
        scope: RateScope,
        scope_ref: Option<Uuid>,
        method: RateMethod,
        rate_amount: Decimal,
    ) -> Self {
        RateCard {
            id: Uuid::new_v4(),
            scope,
            scope_ref,
            method,
            rate_amount,
            single_mile_rate: None,
            double_mile_rate: None,
            triple_mile_rate: None,
            flat_trip_amount: None,
            minimum_amount: None,
            maximum_amount: None,
            priority: 0,
            effective_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            expiration_date: None,
            active: true,
            accessorials: Vec::new(),
        }
    }

    /// Checks whether this card is within its validity window on `date`.
    ///
    /// The window is inclusive on both ends; a missing expiration date means
    /// the card is open-ended.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        if date < self.effective_date {
            return false;
        }
        match self.expiration_date {
            Some(expiry) => date <= expiry,
            None => true,
        }
    }

    /// Returns the per-mile rate for the given trailer configuration, if the
    /// card defines one.
    pub fn mile_rate_for(&self, config: TrailerConfig) -> Option<Decimal> {
        match config {
            TrailerConfig::Single => self.single_mile_rate,
            TrailerConfig::Double => self.double_mile_rate,
            TrailerConfig::Triple => self.triple_mile_rate,
        }
    }

    /// Returns the accessorial sub-rate for the given type, if defined.
    pub fn accessorial_for(&self, accessorial_type: AccessorialType) -> Option<&AccessorialRate> {
        self.accessorials
            .iter()
            .find(|a| a.accessorial_type == accessorial_type)
    }
}
