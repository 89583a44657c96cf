//! Voltage samples and the linear scale that produces them.

use thiserror::Error;

/// Errors produced when converting or validating a voltage scale.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    /// A raw count above the converter's full-scale value.
    #[error("raw count {raw} exceeds full scale {max_count}")]
    OutOfRange { raw: u16, max_count: u16 },

    /// The scale cannot map counts to volts.
    #[error("invalid voltage scale: {0}")]
    Invalid(&'static str),
}

/// Linear mapping from raw converter counts to volts.
///
/// `voltage = raw / max_count * v_ref`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VoltageScale {
    /// Full-scale raw count (4095 for a 12-bit converter).
    pub max_count: u16,
    /// Reference voltage corresponding to `max_count`.
    pub v_ref: f64,
}

impl VoltageScale {
    /// 12-bit converter with a 3.3 V reference.
    pub const DEFAULT: VoltageScale = VoltageScale {
        max_count: 4095,
        v_ref: 3.3,
    };

    pub const fn new(max_count: u16, v_ref: f64) -> Self {
        Self { max_count, v_ref }
    }

    /// Check that the scale maps counts to a positive, finite range.
    pub fn validate(&self) -> Result<(), ScaleError> {
        if self.max_count == 0 {
            return Err(ScaleError::Invalid("max_count must be greater than zero"));
        }
        if !self.v_ref.is_finite() || self.v_ref <= 0.0 {
            return Err(ScaleError::Invalid("v_ref must be a positive, finite voltage"));
        }
        Ok(())
    }

    /// Convert a raw count into a sample.
    pub fn sample(&self, raw: u16) -> Result<VoltageSample, ScaleError> {
        if raw > self.max_count {
            return Err(ScaleError::OutOfRange {
                raw,
                max_count: self.max_count,
            });
        }
        Ok(VoltageSample {
            raw,
            voltage: raw as f64 / self.max_count as f64 * self.v_ref,
        })
    }

    /// Nearest raw count for a voltage, clamped to `0..=max_count`.
    pub fn raw_for(&self, voltage: f64) -> u16 {
        let raw = (voltage / self.v_ref * self.max_count as f64).round();
        raw.clamp(0.0, self.max_count as f64) as u16
    }
}

impl Default for VoltageScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A single instantaneous reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageSample {
    /// Raw converter count, always within `0..=max_count` of its scale.
    pub raw: u16,
    /// Scaled reading in volts.
    pub voltage: f64,
}
