//! Error types for the settlement engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during rate resolution,
//! calculation, projection, and lifecycle management.
//!
//! Two conditions the engine deliberately does NOT treat as errors: an
//! unresolved rate card (the trip pay stays `Pending` awaiting a manual
//! rate) and per-item failures inside a bulk operation (reported as
//! structured outcomes so one bad item never aborts the batch).

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::PayPeriodStatus;

/// The main error type for the settlement engine.
///
/// All fallible operations in the engine return this error type, making it
/// easy to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use linehaul_settlement::error::EngineError;
/// use uuid::Uuid;
///
/// let id = Uuid::nil();
/// let error = EngineError::TripNotFound { trip_id: id };
/// assert_eq!(
///     error.to_string(),
///     format!("Trip not found: {}", id)
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// No trip exists with the given id.
    #[error("Trip not found: {trip_id}")]
    TripNotFound {
        /// The trip id that was not found.
        trip_id: Uuid,
    },

    /// No trip pay record exists with the given id.
    #[error("Trip pay not found: {trip_pay_id}")]
    TripPayNotFound {
        /// The trip pay id that was not found.
        trip_pay_id: Uuid,
    },

    /// No cut pay request exists with the given id.
    #[error("Cut pay request not found: {cut_pay_id}")]
    CutPayNotFound {
        /// The cut pay request id that was not found.
        cut_pay_id: Uuid,
    },

    /// No payroll line item exists with the given id.
    #[error("Payroll line item not found: {line_item_id}")]
    LineItemNotFound {
        /// The line item id that was not found.
        line_item_id: Uuid,
    },

    /// No pay period exists with the given id.
    #[error("Pay period not found: {period_id}")]
    PayPeriodNotFound {
        /// The pay period id that was not found.
        period_id: Uuid,
    },

    /// A trip is missing data required for calculation (driver, linehaul
    /// profile). Aborts calculation for that trip only.
    #[error("Trip {trip_id} is missing required data: {field}")]
    MissingPrerequisite {
        /// The trip whose calculation was aborted.
        trip_id: Uuid,
        /// The missing field.
        field: String,
    },

    /// A pay-period lifecycle rule rejected the operation. No partial
    /// change is made.
    #[error("Invalid lifecycle transition from {from:?}: {attempted}")]
    InvalidLifecycleTransition {
        /// The period state at the time of the attempt.
        from: PayPeriodStatus,
        /// A description of the rejected operation.
        attempted: String,
    },

    /// An edit would leave the stored component sum disagreeing with the
    /// stored total beyond rounding tolerance.
    #[error(
        "Reconciliation violation: components sum to {component_sum} but total is {stated_total}"
    )]
    ReconciliationViolation {
        /// The sum of the stored pay components.
        component_sum: Decimal,
        /// The total the edit asked to store.
        stated_total: Decimal,
    },

    /// An edit payload does not fit the targeted line's source kind (a
    /// trip-shaped edit against a cut-sourced line, or vice versa).
    #[error("Edit not applicable to line item {line_item_id}: {message}")]
    EditNotApplicable {
        /// The targeted line item.
        line_item_id: Uuid,
        /// Why the edit does not apply.
        message: String,
    },

    /// Engine settings could not be loaded or parsed.
    #[error("Failed to load settings from '{path}': {message}")]
    SettingsError {
        /// The path to the settings file.
        path: String,
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_trip_not_found_displays_id() {
        let id = Uuid::nil();
        let error = EngineError::TripNotFound { trip_id: id };
        assert_eq!(error.to_string(), format!("Trip not found: {}", id));
    }

    #[test]
    fn test_missing_prerequisite_displays_field() {
        let id = Uuid::nil();
        let error = EngineError::MissingPrerequisite {
            trip_id: id,
            field: "driver".to_string(),
        };
        assert_eq!(
            error.to_string(),
            format!("Trip {} is missing required data: driver", id)
        );
    }

    #[test]
    fn test_invalid_lifecycle_transition_displays_state() {
        let error = EngineError::InvalidLifecycleTransition {
            from: PayPeriodStatus::Locked,
            attempted: "create trip pay".to_string(),
        };
        assert!(error.to_string().contains("Locked"));
        assert!(error.to_string().contains("create trip pay"));
    }

    #[test]
    fn test_reconciliation_violation_displays_amounts() {
        let error = EngineError::ReconciliationViolation {
            component_sum: Decimal::from_str("410.55").unwrap(),
            stated_total: Decimal::from_str("400.00").unwrap(),
        };
        assert!(error.to_string().contains("410.55"));
        assert!(error.to_string().contains("400.00"));
    }

    #[test]
    fn test_settings_error_displays_path_and_message() {
        let error = EngineError::SettingsError {
            path: "/etc/settlement.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load settings from '/etc/settlement.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::TripNotFound {
                trip_id: Uuid::nil(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
