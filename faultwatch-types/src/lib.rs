//! # faultwatch-types
//!
//! Core types for single-channel voltage fault detection. This crate defines
//! the values that flow through the faultwatch pipeline and the JSON wire
//! format understood by the fault API.
//!
//! ## Design Goals
//!
//! - **Plain values**: every type here is cheap to copy or clone and carries
//!   no I/O
//! - **Optional serialization**: enable the `serde` feature for the report
//!   wire format and for loading thresholds from configuration
//! - **Enum-first**: fault states compare as enums and only become strings at
//!   the serialization boundary
//!
//! ## Example
//!
//! ```rust
//! use faultwatch_types::{FaultState, Report, Thresholds, VoltageScale};
//!
//! let scale = VoltageScale::default(); // 12-bit ADC, 3.3 V reference
//! let sample = scale.sample(2048).unwrap();
//! assert!((sample.voltage - 1.65).abs() < 0.01);
//!
//! let thresholds = Thresholds::default();
//! assert!(thresholds.validate().is_ok());
//!
//! let report = Report::new(FaultState::ShortCircuit, "light-1", "2024-01-01T00:00:00Z");
//! assert_eq!(report.fault_state.as_str(), "short_circuit");
//! ```

mod fault;
mod report;
mod thresholds;
mod voltage;

pub use fault::*;
pub use report::*;
pub use thresholds::*;
pub use voltage::*;
