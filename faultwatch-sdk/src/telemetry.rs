//! Periodic voltage telemetry.
//!
//! Independent of fault reporting: every `interval` the latest reading goes
//! out as `{"voltage": v}` on its own transport. Failures are logged and the
//! next reading is sent on schedule.

use std::sync::Arc;
use std::time::Duration;

use faultwatch_types::VoltageReading;
use tracing::{debug, warn};

use crate::dispatcher::{DispatchOutcome, Transport};

/// Streams voltage readings at a fixed interval.
#[derive(Debug, Clone)]
pub struct Telemetry {
    transport: Arc<dyn Transport>,
    interval: Duration,
    last_sent: Option<Duration>,
}

impl Telemetry {
    pub fn new(transport: Arc<dyn Transport>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
            last_sent: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// The first reading is always due, then one per interval.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        }
    }

    /// Send `voltage` if a reading is due at `now`.
    pub async fn publish(&mut self, voltage: f64, now: Duration) -> Option<DispatchOutcome> {
        if !self.is_due(now) {
            return None;
        }
        self.last_sent = Some(now);

        let payload = match serde_json::to_vec(&VoltageReading { voltage }) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize voltage reading");
                return Some(DispatchOutcome::TransportError(e.to_string()));
            }
        };

        let outcome = match self.transport.send(&payload).await {
            Ok(status) => {
                debug!(voltage, endpoint = self.transport.description(), "Voltage reading sent");
                DispatchOutcome::Sent(status)
            }
            Err(e) => {
                warn!(voltage, error = %e, "Voltage reading not delivered");
                DispatchOutcome::TransportError(e.to_string())
            }
        };
        Some(outcome)
    }
}
