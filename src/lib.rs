//! # faultwatch
//!
//! A voltage fault detection agent for network-connected light fixtures.
//!
//! The agent samples one analog input every second, classifies the reading
//! into a fault state, and reports state changes (plus periodic heartbeats)
//! to a remote fault API as JSON. Optionally, every reading is also
//! streamed as `{"voltage": v}` to a WebSocket collector.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             agent                                │
//! │  ┌─────────┐   ┌────────────┐   ┌───────────┐   ┌────────────┐   │
//! │  │ source  │──▶│ classifier │──▶│ scheduler │──▶│ dispatcher │──▶ API
//! │  │ (ADC)   │   │            │   │           │   │            │   │
//! │  └─────────┘   └────────────┘   └───────────┘   └─────┬──────┘   │
//! │                                                       │          │
//! │                                 ┌──────────────┐      │          │
//! │                                 │ connectivity │──────┘          │
//! │                                 │  (watcher)   │                 │
//! │                                 └──────────────┘                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`settings`]**: Layered configuration (defaults, TOML file, environment)
//! - **[`source`]**: Hardware samplers: the Linux IIO sysfs node and a
//!   scripted bench scenario
//! - **[`connectivity`]**: Background reachability probe feeding the
//!   dispatcher's connected flag
//! - **[`agent`]**: Wires everything into a [`Monitor`] and runs it
//!
//! The classification and scheduling engine lives in `faultwatch-sdk`; the
//! HTTP, TCP and WebSocket transports live in `faultwatch-adapters`.
//!
//! ## Usage
//!
//! ```bash
//! # Run against the default IIO node and fault API
//! faultwatch
//!
//! # Bench run: scripted scenario, 60 ticks, JSON logs
//! FAULTWATCH_SAMPLER__KIND=scenario faultwatch --ticks 60 --log-format json
//!
//! # Also stream readings to the bench WebSocket collector
//! FAULTWATCH_TELEMETRY__ENDPOINT=ws://10.0.0.5:8080 faultwatch
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use faultwatch::{agent, Settings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let status = agent::run(settings, Some(10)).await?;
//! println!("sent {} reports", status.reports_sent);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod connectivity;
pub mod settings;
pub mod source;

// Re-export main types for convenience
pub use connectivity::ConnectivityWatcher;
pub use faultwatch_sdk::{FaultState, Monitor, Report, StatusSnapshot, Thresholds};
pub use settings::Settings;
pub use source::{IioFileSampler, ScenarioSampler};
