//! The monitoring loop.

use std::sync::Arc;
use std::time::Duration;

use faultwatch_types::{FaultState, ScaleError, ThresholdError, Thresholds, VoltageSample, VoltageScale};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::builder::ReportBuilder;
use crate::classifier::Classifier;
use crate::clock::{Clock, SystemClock};
use crate::dispatcher::{Connectivity, ConnectivityFlag, DispatchOutcome, Dispatcher, Transport};
use crate::sampler::{HardwareSampler, SamplerError, SignalSampler};
use crate::scheduler::{MonitorState, ReportReason, Scheduler};
use crate::status::AgentStatus;
use crate::telemetry::Telemetry;

/// Errors raised while assembling a [`Monitor`].
#[derive(Debug, Error)]
pub enum MonitorBuildError {
    #[error("no hardware sampler configured")]
    MissingHardware,

    #[error("no transport configured")]
    MissingTransport,

    #[error("light identifier must not be empty")]
    MissingSourceId,

    #[error("sample period must be greater than zero")]
    ZeroPeriod,

    #[error("telemetry interval must be greater than zero")]
    ZeroTelemetryInterval,

    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error("invalid voltage scale: {0}")]
    Scale(#[from] ScaleError),
}

/// What happened on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub sample: VoltageSample,
    pub state: FaultState,
    /// Set when the tick produced a report.
    pub reason: Option<ReportReason>,
    /// Set when a report was handed to the dispatcher.
    pub dispatch: Option<DispatchOutcome>,
    /// Set when a voltage reading was streamed.
    pub telemetry: Option<DispatchOutcome>,
}

/// Periodic sample, classify, schedule and report loop.
///
/// The monitor owns all loop state. It runs on a single task; the only state
/// it shares is the connectivity flag it reads and the [`AgentStatus`] it
/// writes.
///
/// # Example
///
/// ```rust,no_run
/// use faultwatch_sdk::{Monitor, HardwareSampler, SamplerError, Transport, TransportError};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Adc;
///
/// impl HardwareSampler for Adc {
///     fn read_raw(&mut self) -> Result<u16, SamplerError> {
///         Ok(2048)
///     }
///
///     fn description(&self) -> &str {
///         "adc"
///     }
/// }
///
/// #[derive(Debug)]
/// struct Stdout;
///
/// #[async_trait::async_trait]
/// impl Transport for Stdout {
///     async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError> {
///         println!("{}", String::from_utf8_lossy(payload));
///         Ok(None)
///     }
///
///     fn description(&self) -> &str {
///         "stdout"
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let mut monitor = Monitor::builder()
///         .hardware(Adc)
///         .transport(Arc::new(Stdout))
///         .source_id("light-1")
///         .build()
///         .unwrap();
///
///     monitor.run_for(10).await.unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct Monitor {
    sampler: SignalSampler<Box<dyn HardwareSampler>>,
    classifier: Classifier,
    scheduler: Scheduler,
    builder: ReportBuilder,
    dispatcher: Dispatcher,
    telemetry: Option<Telemetry>,
    clock: Arc<dyn Clock>,
    state: MonitorState,
    status: AgentStatus,
    period: Duration,
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// Loop state after the most recent tick.
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn status(&self) -> &AgentStatus {
        &self.status
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one iteration: sample, classify, maybe report, remember the
    /// voltage for the next fluctuation check.
    ///
    /// Delivery problems are carried in the outcome. Only a sampler failure
    /// is an error.
    pub async fn tick(&mut self) -> Result<TickOutcome, SamplerError> {
        let sample = self.sampler.sample()?;
        let state = self.classifier.classify(sample.voltage, self.state.previous_voltage);

        debug!(raw = sample.raw, voltage = sample.voltage, state = %state, "Sampled");

        let now = self.clock.elapsed();
        let reason = self.scheduler.evaluate(state, &mut self.state, now);

        let dispatch = match reason {
            Some(reason) => {
                if let ReportReason::Transition { from, to } = reason {
                    info!(%from, %to, voltage = sample.voltage, "State changed");
                }
                let report = self.builder.build(state, self.clock.now_utc());
                Some(self.dispatcher.dispatch(&report).await)
            }
            None => None,
        };

        let telemetry = match self.telemetry.as_mut() {
            Some(telemetry) => telemetry.publish(sample.voltage, now).await,
            None => None,
        };
        if let Some(outcome) = &telemetry {
            self.status.record_telemetry(outcome);
        }

        self.state.previous_voltage = Some(sample.voltage);
        self.status.record_tick(&sample, state, dispatch.as_ref());

        Ok(TickOutcome {
            sample,
            state,
            reason,
            dispatch,
            telemetry,
        })
    }

    /// Tick every period until `stop` turns true or its sender goes away.
    ///
    /// Returns the sampler error that ended the loop, if any.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<(), SamplerError> {
        info!(
            input = self.sampler.hardware().description(),
            endpoint = self.dispatcher.transport().description(),
            period = ?self.period,
            "Monitor started"
        );
        if let Some(telemetry) = &self.telemetry {
            info!(
                endpoint = telemetry.transport().description(),
                interval = ?telemetry.interval(),
                "Streaming voltage telemetry"
            );
        }

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!(error = %e, "Sampling failed, stopping monitor");
                        return Err(e);
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Monitor stopped");
        Ok(())
    }

    /// Run exactly `ticks` iterations at the configured period.
    pub async fn run_for(&mut self, ticks: u64) -> Result<(), SamplerError> {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for _ in 0..ticks {
            interval.tick().await;
            self.tick().await?;
        }
        Ok(())
    }
}

/// Builder for configuring a [`Monitor`].
///
/// Hardware, transport and light identifier are required. Everything else
/// falls back to the bench defaults: 12-bit/3.3 V scale, default thresholds,
/// 30 s / 5 s heartbeats, 1 s period, always connected, system clock.
#[derive(Debug, Default)]
pub struct MonitorBuilder {
    hardware: Option<Box<dyn HardwareSampler>>,
    scale: Option<VoltageScale>,
    thresholds: Option<Thresholds>,
    scheduler: Option<Scheduler>,
    source_id: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    connectivity: Option<Arc<dyn Connectivity>>,
    telemetry: Option<(Arc<dyn Transport>, Duration)>,
    clock: Option<Arc<dyn Clock>>,
    period: Option<Duration>,
    status: Option<AgentStatus>,
}

impl MonitorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hardware(mut self, hardware: impl HardwareSampler + 'static) -> Self {
        self.hardware = Some(Box::new(hardware));
        self
    }

    /// Use an already boxed hardware sampler.
    pub fn boxed_hardware(mut self, hardware: Box<dyn HardwareSampler>) -> Self {
        self.hardware = Some(hardware);
        self
    }

    pub fn scale(mut self, scale: VoltageScale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Set the heartbeat intervals for the normal and fault states.
    pub fn heartbeats(mut self, normal: Duration, fault: Duration) -> Self {
        self.scheduler = Some(Scheduler::new(normal, fault));
        self
    }

    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Also stream every reading to `transport`, at most once per `interval`.
    pub fn telemetry(mut self, transport: Arc<dyn Transport>, interval: Duration) -> Self {
        self.telemetry = Some((transport, interval));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the time between ticks.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Share an existing status handle instead of creating one.
    pub fn status(mut self, status: AgentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<Monitor, MonitorBuildError> {
        let hardware = self.hardware.ok_or(MonitorBuildError::MissingHardware)?;
        let transport = self.transport.ok_or(MonitorBuildError::MissingTransport)?;
        let source_id = self
            .source_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(MonitorBuildError::MissingSourceId)?;

        let period = self.period.unwrap_or(Duration::from_secs(1));
        if period.is_zero() {
            return Err(MonitorBuildError::ZeroPeriod);
        }

        let scale = self.scale.unwrap_or_default();
        scale.validate()?;

        let thresholds = self.thresholds.unwrap_or_default();
        thresholds.validate()?;

        let telemetry = match self.telemetry {
            Some((_, interval)) if interval.is_zero() => {
                return Err(MonitorBuildError::ZeroTelemetryInterval)
            }
            Some((transport, interval)) => Some(Telemetry::new(transport, interval)),
            None => None,
        };

        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ConnectivityFlag::new(true)));

        Ok(Monitor {
            sampler: SignalSampler::new(hardware, scale),
            classifier: Classifier::new(thresholds),
            scheduler: self.scheduler.unwrap_or_default(),
            builder: ReportBuilder::new(source_id),
            dispatcher: Dispatcher::new(transport, connectivity),
            telemetry,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            state: MonitorState::default(),
            status: self.status.unwrap_or_default(),
            period,
        })
    }
}
