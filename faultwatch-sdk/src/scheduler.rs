//! Reporting cadence.
//!
//! A report goes out when the classified state differs from the last one
//! recorded, or when the state is unchanged but its heartbeat interval has
//! elapsed since the last report. There is no debounce: a single noisy tick
//! is reported as a full transition.

use std::time::Duration;

use faultwatch_types::FaultState;

/// Loop state carried from one tick to the next.
///
/// Owned by the [`Monitor`](crate::Monitor); the scheduler only sees it by
/// reference for the duration of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorState {
    /// Voltage of the preceding tick, `None` until the first sample.
    pub previous_voltage: Option<f64>,
    /// Last state recorded by a report decision.
    pub current_state: FaultState,
    /// Monotonic time of the last report decision.
    pub last_report: Duration,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            previous_voltage: None,
            current_state: FaultState::Normal,
            last_report: Duration::ZERO,
        }
    }
}

/// Why a report was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportReason {
    /// The classified state changed.
    Transition { from: FaultState, to: FaultState },
    /// The state is unchanged and its heartbeat interval elapsed.
    Heartbeat,
}

/// Decides when a classified state is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    normal_heartbeat: Duration,
    fault_heartbeat: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            normal_heartbeat: Duration::from_secs(30),
            fault_heartbeat: Duration::from_secs(5),
        }
    }
}

impl Scheduler {
    pub fn new(normal_heartbeat: Duration, fault_heartbeat: Duration) -> Self {
        Self {
            normal_heartbeat,
            fault_heartbeat,
        }
    }

    pub fn normal_heartbeat(&self) -> Duration {
        self.normal_heartbeat
    }

    pub fn fault_heartbeat(&self) -> Duration {
        self.fault_heartbeat
    }

    /// Heartbeat interval that applies while `state` persists.
    pub fn heartbeat_for(&self, state: FaultState) -> Duration {
        if state.is_fault() {
            self.fault_heartbeat
        } else {
            self.normal_heartbeat
        }
    }

    /// Whether `new_state`, observed at `now`, should be reported.
    pub fn should_report(&self, new_state: FaultState, state: &MonitorState, now: Duration) -> bool {
        self.decide(new_state, state, now).is_some()
    }

    /// Decide, and record the decision in `state` when reporting.
    ///
    /// On `Some`, `state.current_state` becomes `new_state` and
    /// `state.last_report` becomes `now`. On `None`, `state` is untouched.
    pub fn evaluate(
        &self,
        new_state: FaultState,
        state: &mut MonitorState,
        now: Duration,
    ) -> Option<ReportReason> {
        let reason = self.decide(new_state, state, now)?;
        state.current_state = new_state;
        state.last_report = now;
        Some(reason)
    }

    fn decide(&self, new_state: FaultState, state: &MonitorState, now: Duration) -> Option<ReportReason> {
        if new_state != state.current_state {
            return Some(ReportReason::Transition {
                from: state.current_state,
                to: new_state,
            });
        }

        let elapsed = now.saturating_sub(state.last_report);
        (elapsed > self.heartbeat_for(new_state)).then_some(ReportReason::Heartbeat)
    }
}
