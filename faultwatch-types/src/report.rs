//! Report - the record sent to the fault API.

use crate::FaultState;

/// A single fault report.
///
/// Serializes (with the `serde` feature) to the fault API's wire format:
///
/// ```json
/// { "fault-type": "short_circuit", "light-ID": "light-1", "timestamp": "2024-01-01T00:00:00Z" }
/// ```
///
/// The mixed field naming is part of the external contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    /// Classified state being reported.
    #[cfg_attr(feature = "serde", serde(rename = "fault-type"))]
    pub fault_state: FaultState,

    /// Identifier of the monitored light.
    #[cfg_attr(feature = "serde", serde(rename = "light-ID"))]
    pub source_id: String,

    /// ISO-8601 UTC timestamp, second precision.
    pub timestamp: String,
}

impl Report {
    pub fn new(
        fault_state: FaultState,
        source_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            fault_state,
            source_id: source_id.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// A bare voltage reading, streamed as telemetry between fault reports.
///
/// Serializes as `{"voltage": 1.65}`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltageReading {
    pub voltage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let report = Report::new(FaultState::Overvoltage, "CB-420", "2024-05-01T12:00:00Z");
        assert_eq!(report.fault_state, FaultState::Overvoltage);
        assert_eq!(report.source_id, "CB-420");
        assert_eq!(report.timestamp, "2024-05-01T12:00:00Z");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wire_format() {
        let report = Report::new(FaultState::Fluctuation, "CB-420 light#2", "2024-05-01T12:00:00Z");
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "fault-type": "voltage_fluctuation",
                "light-ID": "CB-420 light#2",
                "timestamp": "2024-05-01T12:00:00Z"
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_voltage_reading_wire_format() {
        let value = serde_json::to_value(VoltageReading { voltage: 1.5 }).unwrap();
        assert_eq!(value, serde_json::json!({ "voltage": 1.5 }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_rejects_unknown_fault_type() {
        let json = r#"{"fault-type": "brownout", "light-ID": "x", "timestamp": "t"}"#;
        assert!(serde_json::from_str::<Report>(json).is_err());
    }
}
