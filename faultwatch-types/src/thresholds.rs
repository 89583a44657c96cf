//! Classification thresholds, in volts.

use thiserror::Error;

/// Error returned by [`Thresholds::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold {0} is not a finite voltage")]
    NotFinite(&'static str),

    #[error("thresholds out of order: {lower} ({lower_value}V) must not exceed {upper} ({upper_value}V)")]
    OutOfOrder {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },

    #[error("fluctuation_delta must be positive, got {0}V")]
    NonPositiveDelta(f64),
}

/// Voltage bands used by the fault classifier.
///
/// Defaults match a 3.3 V supply monitored through a divider that sits
/// around 2 V under normal load.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Thresholds {
    /// Readings below this are a short circuit.
    pub short_circuit: f64,
    /// Lower edge of the normal band (inclusive).
    pub normal_min: f64,
    /// Upper edge of the normal band (inclusive).
    pub normal_max: f64,
    /// Readings above this (up to `open_circuit`) are overvoltage.
    pub overvoltage: f64,
    /// Readings above this are an open circuit.
    pub open_circuit: f64,
    /// Largest tolerated change between consecutive samples.
    pub fluctuation_delta: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            short_circuit: 0.3,
            normal_min: 1.0,
            normal_max: 3.0,
            overvoltage: 3.1,
            open_circuit: 3.2,
            fluctuation_delta: 0.5,
        }
    }
}

impl Thresholds {
    fn bands(&self) -> [(&'static str, f64); 5] {
        [
            ("short_circuit", self.short_circuit),
            ("normal_min", self.normal_min),
            ("normal_max", self.normal_max),
            ("overvoltage", self.overvoltage),
            ("open_circuit", self.open_circuit),
        ]
    }

    /// Check that every value is finite and the bands are ordered
    /// `short_circuit <= normal_min <= normal_max <= overvoltage <= open_circuit`.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let bands = self.bands();

        if let Some((name, _)) = bands.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ThresholdError::NotFinite(name));
        }
        if !self.fluctuation_delta.is_finite() {
            return Err(ThresholdError::NotFinite("fluctuation_delta"));
        }

        for pair in bands.windows(2) {
            let (lower, lower_value) = pair[0];
            let (upper, upper_value) = pair[1];
            if lower_value > upper_value {
                return Err(ThresholdError::OutOfOrder {
                    lower,
                    lower_value,
                    upper,
                    upper_value,
                });
            }
        }

        if self.fluctuation_delta <= 0.0 {
            return Err(ThresholdError::NonPositiveDelta(self.fluctuation_delta));
        }

        Ok(())
    }
}
