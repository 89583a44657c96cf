//! # faultwatch-sdk
//!
//! Fault classification and reporting engine for a single analog voltage
//! input.
//!
//! Each tick the [`Monitor`] takes one sample, classifies it against a set of
//! [`Thresholds`], and asks the [`Scheduler`] whether the result is worth
//! reporting. Reports go out on every state change, and as heartbeats while a
//! state persists: every 30 s when normal, every 5 s while faulted.
//!
//! ## Quick Start
//!
//! ```rust
//! use faultwatch_sdk::{classify, FaultState, MonitorState, Scheduler, Thresholds};
//! use std::time::Duration;
//!
//! let thresholds = Thresholds::default();
//! let state = classify(0.1, None, &thresholds);
//! assert_eq!(state, FaultState::ShortCircuit);
//!
//! let scheduler = Scheduler::default();
//! let mut loop_state = MonitorState::default();
//! assert!(scheduler.evaluate(state, &mut loop_state, Duration::from_secs(1)).is_some());
//! assert!(scheduler.evaluate(state, &mut loop_state, Duration::from_secs(2)).is_none());
//! ```
//!
//! ## Seams
//!
//! - **[`HardwareSampler`]**: where raw counts come from
//! - **[`Transport`]**: where serialized reports go
//! - **[`Connectivity`]**: whether the network is up
//! - **[`Clock`]**: monotonic and wall-clock time, replaceable in tests
//!
//! A [`Telemetry`] stream can be attached to the monitor to send every
//! reading, at a fixed interval, to a second transport.

mod builder;
mod classifier;
mod clock;
mod dispatcher;
mod monitor;
mod sampler;
mod scheduler;
mod status;
mod telemetry;

pub use builder::{format_timestamp, ReportBuilder, TIMESTAMP_FORMAT};
pub use classifier::{classify, Classifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{
    Connectivity, ConnectivityFlag, DispatchOutcome, Dispatcher, Transport, TransportError,
};
pub use monitor::{Monitor, MonitorBuildError, MonitorBuilder, TickOutcome};
pub use sampler::{HardwareSampler, SamplerError, SignalSampler};
pub use scheduler::{MonitorState, ReportReason, Scheduler};
pub use status::{AgentStatus, LastTick, StatusSnapshot};
pub use telemetry::Telemetry;

// Re-export types for convenience
pub use faultwatch_types::{
    FaultState, Report, ScaleError, ThresholdError, Thresholds, VoltageReading, VoltageSample,
    VoltageScale,
};
