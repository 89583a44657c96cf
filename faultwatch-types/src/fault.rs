//! Fault states - the classified operating condition of the monitored circuit.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Classified operating condition of the monitored circuit.
///
/// Variants are declared in classifier evaluation order, not by severity.
/// The wire name of each variant is what the fault API expects in the
/// `fault-type` field of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FaultState {
    /// Voltage inside the normal operating band.
    #[default]
    Normal,
    /// Voltage collapsed below the short-circuit threshold.
    ShortCircuit,
    /// Voltage above the open-circuit threshold (no load drawing current).
    OpenCircuit,
    /// Voltage between the overvoltage and open-circuit thresholds.
    Overvoltage,
    /// Voltage between the short-circuit threshold and the normal band.
    Undervoltage,
    /// Sudden change between consecutive samples.
    #[cfg_attr(feature = "serde", serde(rename = "voltage_fluctuation"))]
    Fluctuation,
}

impl FaultState {
    /// Every state, in classifier evaluation order.
    pub const ALL: [FaultState; 6] = [
        FaultState::ShortCircuit,
        FaultState::OpenCircuit,
        FaultState::Overvoltage,
        FaultState::Undervoltage,
        FaultState::Fluctuation,
        FaultState::Normal,
    ];

    /// Wire name used in reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FaultState::Normal => "normal",
            FaultState::ShortCircuit => "short_circuit",
            FaultState::OpenCircuit => "open_circuit",
            FaultState::Overvoltage => "overvoltage",
            FaultState::Undervoltage => "undervoltage",
            FaultState::Fluctuation => "voltage_fluctuation",
        }
    }

    /// Returns true for every state except [`FaultState::Normal`].
    pub const fn is_fault(&self) -> bool {
        !matches!(self, FaultState::Normal)
    }
}

impl fmt::Display for FaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown fault state name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fault state: {0:?}")]
pub struct ParseFaultStateError(pub String);

impl FromStr for FaultState {
    type Err = ParseFaultStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FaultState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ParseFaultStateError(s.to_string()))
    }
}
