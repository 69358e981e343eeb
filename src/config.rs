//! Engine settings.
//!
//! Tuning values that operations may want to adjust without a code change:
//! the fixed unit rates used for the display-level accessorial breakdown and
//! the chunk size used by bulk operations. Settings load from a YAML file
//! and fall back to built-in defaults when no file is supplied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Engine tuning values.
///
/// # Example
///
/// ```
/// use linehaul_settlement::config::EngineSettings;
///
/// let settings = EngineSettings::default();
/// assert_eq!(settings.approval_chunk_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Display unit rate per drop-and-hook event.
    #[serde(default = "default_drop_and_hook_rate")]
    pub drop_and_hook_rate: Decimal,
    /// Display unit rate per chain-up cycle.
    #[serde(default = "default_chain_up_rate")]
    pub chain_up_rate: Decimal,
    /// Display unit rate per hour of wait time.
    #[serde(default = "default_wait_time_hourly_rate")]
    pub wait_time_hourly_rate: Decimal,
    /// Number of items processed per committed chunk in bulk operations.
    /// Kept small to bound peak memory and transaction size.
    #[serde(default = "default_approval_chunk_size")]
    pub approval_chunk_size: usize,
}

fn default_drop_and_hook_rate() -> Decimal {
    Decimal::from_str("25.00").unwrap()
}

fn default_chain_up_rate() -> Decimal {
    Decimal::from_str("15.00").unwrap()
}

fn default_wait_time_hourly_rate() -> Decimal {
    Decimal::from_str("18.00").unwrap()
}

fn default_approval_chunk_size() -> usize {
    25
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            drop_and_hook_rate: default_drop_and_hook_rate(),
            chain_up_rate: default_chain_up_rate(),
            wait_time_hourly_rate: default_wait_time_hourly_rate(),
            approval_chunk_size: default_approval_chunk_size(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from a YAML file.
    ///
    /// Missing keys fall back to their defaults; a missing or malformed file
    /// is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| EngineError::SettingsError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&contents).map_err(|e| EngineError::SettingsError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
