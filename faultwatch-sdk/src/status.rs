//! Shared agent status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use faultwatch_types::{FaultState, VoltageSample};
use parking_lot::RwLock;

use crate::dispatcher::DispatchOutcome;

/// Counters and the most recent tick, readable from any task.
///
/// Clones share the same counters. The monitor writes, everything else reads.
#[derive(Debug, Clone, Default)]
pub struct AgentStatus {
    inner: Arc<StatusInner>,
}

#[derive(Debug, Default)]
struct StatusInner {
    ticks: AtomicU64,
    reports_sent: AtomicU64,
    reports_skipped: AtomicU64,
    reports_failed: AtomicU64,
    telemetry_sent: AtomicU64,
    telemetry_failed: AtomicU64,
    last_tick: RwLock<Option<LastTick>>,
    last_outcome: RwLock<Option<DispatchOutcome>>,
}

/// What the monitor saw on its most recent tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastTick {
    pub raw: u16,
    pub voltage: f64,
    pub state: FaultState,
}

/// Point-in-time copy of [`AgentStatus`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    pub ticks: u64,
    /// Reports the endpoint accepted.
    pub reports_sent: u64,
    /// Reports dropped because the network was down.
    pub reports_skipped: u64,
    /// Reports the transport failed on or the endpoint rejected.
    pub reports_failed: u64,
    /// Voltage readings handed to the telemetry transport.
    pub telemetry_sent: u64,
    pub telemetry_failed: u64,
    pub last_tick: Option<LastTick>,
    /// Outcome of the most recent report decision.
    pub last_outcome: Option<DispatchOutcome>,
}

impl StatusSnapshot {
    /// Every report decision, whatever happened to it.
    pub fn reports_attempted(&self) -> u64 {
        self.reports_sent + self.reports_skipped + self.reports_failed
    }
}

impl AgentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed tick and, if a report was scheduled, its outcome.
    pub fn record_tick(
        &self,
        sample: &VoltageSample,
        state: FaultState,
        dispatch: Option<&DispatchOutcome>,
    ) {
        self.inner.ticks.fetch_add(1, Ordering::Relaxed);

        if let Some(outcome) = dispatch {
            let counter = match outcome {
                DispatchOutcome::SkippedNotConnected => &self.inner.reports_skipped,
                o if o.is_delivered() => &self.inner.reports_sent,
                _ => &self.inner.reports_failed,
            };
            counter.fetch_add(1, Ordering::Relaxed);
            *self.inner.last_outcome.write() = Some(outcome.clone());
        }

        *self.inner.last_tick.write() = Some(LastTick {
            raw: sample.raw,
            voltage: sample.voltage,
            state,
        });
    }

    /// Record one telemetry attempt.
    pub fn record_telemetry(&self, outcome: &DispatchOutcome) {
        let counter = if outcome.is_delivered() {
            &self.inner.telemetry_sent
        } else {
            &self.inner.telemetry_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ticks: self.inner.ticks.load(Ordering::Relaxed),
            reports_sent: self.inner.reports_sent.load(Ordering::Relaxed),
            reports_skipped: self.inner.reports_skipped.load(Ordering::Relaxed),
            reports_failed: self.inner.reports_failed.load(Ordering::Relaxed),
            telemetry_sent: self.inner.telemetry_sent.load(Ordering::Relaxed),
            telemetry_failed: self.inner.telemetry_failed.load(Ordering::Relaxed),
            last_tick: *self.inner.last_tick.read(),
            last_outcome: self.inner.last_outcome.read().clone(),
        }
    }
}
