//! Trip, delay, and trip-report models.
//!
//! Trips are created by the dispatch subsystem (out of scope); the engine
//! reads them to calculate pay. Delay records drive accessorial pricing and
//! the driver's trip report supplies the operational counts used for the
//! display-level accessorial breakdown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational delay codes recorded against a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayCode {
    /// Held at a shipper or consignee.
    Detention,
    /// Tractor or trailer breakdown.
    EquipmentBreakdown,
    /// Driver ran out of hours or was otherwise unavailable.
    DriverUnavailability,
    /// Weather hold.
    Weather,
    /// Traffic hold.
    Traffic,
    /// Anything else.
    Other,
}

/// One delay/exception record on a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDelay {
    /// The delay code.
    pub code: DelayCode,
    /// How long the delay lasted.
    pub duration_minutes: u32,
    /// Free-text note from dispatch.
    #[serde(default)]
    pub note: Option<String>,
}

impl TripDelay {
    /// Returns the delay duration in hours as a decimal.
    pub fn duration_hours(&self) -> Decimal {
        Decimal::from(self.duration_minutes) / Decimal::from(60)
    }
}

/// A completed or in-progress linehaul trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable trip number.
    pub trip_number: String,
    /// The assigned driver, if any.
    pub driver_id: Option<Uuid>,
    /// Denormalized driver display name.
    pub driver_name: String,
    /// The carrier operating the trip.
    pub carrier_id: Option<Uuid>,
    /// The linehaul profile this trip runs.
    pub linehaul_profile_id: Option<Uuid>,
    /// The origin/destination pair (route) identifier.
    pub route_id: Option<Uuid>,
    /// Origin terminal code.
    pub origin_terminal: String,
    /// Destination terminal code.
    pub destination_terminal: String,
    /// When the trip was dispatched.
    pub dispatch_time: DateTime<Utc>,
    /// When the trip arrived, if it has.
    pub arrival_time: Option<DateTime<Utc>>,
    /// Trip miles.
    pub miles: Decimal,
    /// Scheduled transit time in hours, used for hourly-method cards.
    pub transit_hours: Decimal,
    /// Number of trailers assigned.
    pub trailer_count: u32,
    /// Fuel cost attributed to the trip, used for total-cost finalization.
    pub fuel_cost: Decimal,
    /// Delay records accumulated during the trip.
    #[serde(default)]
    pub delays: Vec<TripDelay>,
}

/// The driver's trip report: operational counts recorded by a separate
/// reporting flow and mirrored onto the payroll ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripReport {
    /// The trip this report belongs to.
    pub trip_id: Uuid,
    /// Number of drop-and-hook events.
    pub drop_and_hook_count: u32,
    /// Number of chain-up cycles.
    pub chain_up_count: u32,
    /// Total wait time in minutes.
    pub wait_time_minutes: u32,
    /// Reason for the wait, if recorded.
    #[serde(default)]
    pub wait_reason: Option<String>,
}

impl TripReport {
    /// An empty report for a trip with no operational exceptions.
    pub fn empty(trip_id: Uuid) -> Self {
        TripReport {
            trip_id,
            drop_and_hook_count: 0,
            chain_up_count: 0,
            wait_time_minutes: 0,
            wait_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_delay_duration_hours() {
        let delay = TripDelay {
            code: DelayCode::Detention,
            duration_minutes: 90,
            note: None,
        };
        assert_eq!(delay.duration_hours(), Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_empty_report_has_zero_counts() {
        let report = TripReport::empty(Uuid::new_v4());
        assert_eq!(report.drop_and_hook_count, 0);
        assert_eq!(report.chain_up_count, 0);
        assert_eq!(report.wait_time_minutes, 0);
        assert!(report.wait_reason.is_none());
    }

    #[test]
    fn test_delay_code_serializes_snake_case() {
        let json = serde_json::to_string(&DelayCode::EquipmentBreakdown).unwrap();
        assert_eq!(json, "\"equipment_breakdown\"");
        let json = serde_json::to_string(&DelayCode::DriverUnavailability).unwrap();
        assert_eq!(json, "\"driver_unavailability\"");
    }
}
