//! Fault classification.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. below `short_circuit` → [`FaultState::ShortCircuit`]
//! 2. above `open_circuit` → [`FaultState::OpenCircuit`]
//! 3. in `(overvoltage, open_circuit]` → [`FaultState::Overvoltage`]
//! 4. in `[short_circuit, normal_min)` → [`FaultState::Undervoltage`]
//! 5. a previous sample exists and the change exceeds `fluctuation_delta`
//!    → [`FaultState::Fluctuation`]
//! 6. in `[normal_min, normal_max]` → [`FaultState::Normal`]
//! 7. anything else → [`FaultState::Normal`]
//!
//! Fluctuation is only reachable once the absolute bands have been ruled
//! out, so a collapse to 0 V is always reported as a short circuit rather
//! than a fluctuation.

use faultwatch_types::{FaultState, Thresholds};

/// Classify a reading against `thresholds`.
///
/// `previous` is the voltage of the preceding tick, or `None` before the
/// first sample. A previous reading of exactly 0 V is a real sample.
pub fn classify(voltage: f64, previous: Option<f64>, thresholds: &Thresholds) -> FaultState {
    if voltage < thresholds.short_circuit {
        return FaultState::ShortCircuit;
    }

    if voltage > thresholds.open_circuit {
        return FaultState::OpenCircuit;
    }

    if voltage > thresholds.overvoltage && voltage <= thresholds.open_circuit {
        return FaultState::Overvoltage;
    }

    if voltage >= thresholds.short_circuit && voltage < thresholds.normal_min {
        return FaultState::Undervoltage;
    }

    if previous.is_some_and(|prev| (voltage - prev).abs() > thresholds.fluctuation_delta) {
        return FaultState::Fluctuation;
    }

    if voltage >= thresholds.normal_min && voltage <= thresholds.normal_max {
        return FaultState::Normal;
    }

    FaultState::Normal
}

/// A classifier bound to one set of thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn classify(&self, voltage: f64, previous: Option<f64>) -> FaultState {
        classify(voltage, previous, &self.thresholds)
    }
}
