//! Report delivery.
//!
//! Delivery is at-most-once and best effort: a report that cannot be sent
//! is logged and dropped. Nothing here retries or buffers.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use faultwatch_types::Report;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Transport-level delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not reach the endpoint.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The endpoint did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The request was sent but failed in flight.
    #[error("request failed: {0}")]
    Request(String),
}

/// Hands serialized reports to the remote endpoint.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Send one JSON payload.
    ///
    /// Returns the response status code when the transport has one, or
    /// `None` when the transport only confirms the write.
    async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError>;

    /// Returns a human-readable description of the endpoint, used in logs.
    fn description(&self) -> &str;
}

/// Read-only view of network connectivity.
pub trait Connectivity: Send + Sync + Debug {
    fn is_connected(&self) -> bool;
}

/// Shared "connected" flag.
///
/// The connectivity collaborator writes it from its own task; the
/// dispatcher reads it once per report without blocking.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityFlag(Arc<AtomicBool>);

impl ConnectivityFlag {
    pub fn new(connected: bool) -> Self {
        Self(Arc::new(AtomicBool::new(connected)))
    }

    /// Store a new value, returning the previous one.
    pub fn set(&self, connected: bool) -> bool {
        self.0.swap(connected, Ordering::Relaxed)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the transport; carries the response status when available.
    Sent(Option<u16>),
    /// Not connected, the transport was not invoked.
    SkippedNotConnected,
    /// The transport failed.
    TransportError(String),
}

impl DispatchOutcome {
    /// True when the endpoint accepted the report (2xx, or a write-only
    /// transport confirmed the write).
    pub fn is_delivered(&self) -> bool {
        match self {
            DispatchOutcome::Sent(None) => true,
            DispatchOutcome::Sent(Some(status)) => (200..300).contains(status),
            _ => false,
        }
    }
}

/// Sends reports through a transport, gated on connectivity.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            transport,
            connectivity,
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Attempt to deliver `report` once. Never fails; the outcome says what
    /// happened.
    pub async fn dispatch(&self, report: &Report) -> DispatchOutcome {
        if !self.connectivity.is_connected() {
            warn!(fault = %report.fault_state, "Not connected, skipping fault report");
            return DispatchOutcome::SkippedNotConnected;
        }

        let payload = match serde_json::to_vec(report) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize fault report");
                return DispatchOutcome::TransportError(e.to_string());
            }
        };

        debug!(
            endpoint = self.transport.description(),
            payload = %String::from_utf8_lossy(&payload),
            "Sending fault report"
        );

        match self.transport.send(&payload).await {
            Ok(status) => {
                let outcome = DispatchOutcome::Sent(status);
                if outcome.is_delivered() {
                    info!(fault = %report.fault_state, status = ?status, "Fault report sent");
                } else {
                    warn!(fault = %report.fault_state, status = ?status, "Endpoint rejected fault report");
                }
                outcome
            }
            Err(e) => {
                error!(fault = %report.fault_state, error = %e, "Fault report delivery failed");
                DispatchOutcome::TransportError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use faultwatch_types::FaultState;
    use parking_lot::Mutex;

    /// Transport that records payloads and answers from a script.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<Vec<u8>>>,
        pub answer: Mutex<Option<Result<Option<u16>, TransportError>>>,
    }

    impl RecordingTransport {
        pub fn answering(answer: Result<Option<u16>, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                answer: Mutex::new(Some(answer)),
            })
        }

        pub fn payloads(&self) -> Vec<serde_json::Value> {
            self.sent
                .lock()
                .iter()
                .map(|p| serde_json::from_slice(p).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError> {
            self.sent.lock().push(payload.to_vec());
            self.answer.lock().clone().unwrap_or(Ok(Some(200)))
        }

        fn description(&self) -> &str {
            "recording"
        }
    }

    fn report() -> Report {
        Report::new(FaultState::ShortCircuit, "light-7", "2024-01-01T00:00:00Z")
    }

    #[tokio::test]
    async fn test_skips_when_not_connected() {
        let transport = RecordingTransport::answering(Ok(Some(200)));
        let dispatcher = Dispatcher::new(transport.clone(), Arc::new(ConnectivityFlag::new(false)));

        let outcome = dispatcher.dispatch(&report()).await;

        assert_eq!(outcome, DispatchOutcome::SkippedNotConnected);
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sends_wire_payload() {
        let transport = RecordingTransport::answering(Ok(Some(201)));
        let dispatcher = Dispatcher::new(transport.clone(), Arc::new(ConnectivityFlag::new(true)));

        let outcome = dispatcher.dispatch(&report()).await;

        assert_eq!(outcome, DispatchOutcome::Sent(Some(201)));
        assert!(outcome.is_delivered());
        assert_eq!(
            transport.payloads(),
            vec![serde_json::json!({
                "fault-type": "short_circuit",
                "light-ID": "light-7",
                "timestamp": "2024-01-01T00:00:00Z"
            })]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_delivered() {
        let transport = RecordingTransport::answering(Ok(Some(401)));
        let dispatcher = Dispatcher::new(transport, Arc::new(ConnectivityFlag::new(true)));

        let outcome = dispatcher.dispatch(&report()).await;

        assert_eq!(outcome, DispatchOutcome::Sent(Some(401)));
        assert!(!outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_transport_error_is_reported_not_raised() {
        let transport = RecordingTransport::answering(Err(TransportError::Timeout));
        let dispatcher = Dispatcher::new(transport.clone(), Arc::new(ConnectivityFlag::new(true)));

        let outcome = dispatcher.dispatch(&report()).await;

        assert_eq!(outcome, DispatchOutcome::TransportError("request timed out".to_string()));
        assert_eq!(transport.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_flag_is_read_on_every_dispatch() {
        let transport = RecordingTransport::answering(Ok(None));
        let flag = ConnectivityFlag::new(false);
        let dispatcher = Dispatcher::new(transport.clone(), Arc::new(flag.clone()));

        assert_eq!(dispatcher.dispatch(&report()).await, DispatchOutcome::SkippedNotConnected);
        assert!(!flag.set(true));
        assert_eq!(dispatcher.dispatch(&report()).await, DispatchOutcome::Sent(None));
        assert_eq!(transport.sent.lock().len(), 1);
    }
}
