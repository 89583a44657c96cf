//! TCP transport.
//!
//! Reports are written as newline-delimited JSON over a single connection.
//! The connection is opened on first use and reopened after a write fails;
//! the failed report itself is not resent. Connecting and writing each run
//! under the transport timeout, so a collector that stops reading cannot
//! stall the caller.

use std::time::Duration;

use async_trait::async_trait;
use faultwatch_sdk::{Transport, TransportError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::AdapterError;

/// Streams reports to a TCP collector.
#[derive(Debug)]
pub struct TcpTransport {
    addr: String,
    timeout: Duration,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpTransport {
    /// Create a transport for `addr` (`host:port`). Nothing is opened until
    /// the first send.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(10),
            stream: Mutex::new(None),
        }
    }

    /// Set the connect and write timeout (default: 10 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<TcpStream, AdapterError> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => {
                debug!(addr = %self.addr, "Connected to collector");
                Ok(stream)
            }
            Ok(Err(e)) => Err(AdapterError::Connection(e.to_string())),
            Err(_) => Err(AdapterError::Timeout),
        }
    }

    async fn write_line(&self, payload: &[u8]) -> Result<(), AdapterError> {
        let mut guard = self.stream.lock().await;

        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');

        match tokio::time::timeout(self.timeout, stream.write_all(&line)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(addr = %self.addr, error = %e, "Collector connection lost");
                return Err(e.into());
            }
            Err(_) => {
                // A partial line may be on the wire, the stream is unusable
                warn!(addr = %self.addr, timeout = ?self.timeout, "Collector stopped reading");
                return Err(AdapterError::Timeout);
            }
        }

        *guard = Some(stream);
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError> {
        self.write_line(payload).await?;
        Ok(None)
    }

    fn description(&self) -> &str {
        &self.addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_writes_newline_delimited_json() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let transport = TcpTransport::new(listener.local_addr().unwrap().to_string());

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let mut received = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                received.push(serde_json::from_str::<serde_json::Value>(&line).unwrap());
                if received.len() == 2 {
                    break;
                }
            }
            received
        });

        assert_eq!(transport.send(br#"{"fault-type":"normal"}"#).await, Ok(None));
        assert_eq!(transport.send(br#"{"fault-type":"overvoltage"}"#).await, Ok(None));

        let received = server.await.unwrap();
        assert_eq!(received[0]["fault-type"], "normal");
        assert_eq!(received[1]["fault-type"], "overvoltage");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let transport = TcpTransport::new(addr);
        assert!(matches!(
            transport.send(b"{}").await,
            Err(TransportError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_write_times_out_when_peer_stops_reading() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let transport = TcpTransport::new(listener.local_addr().unwrap().to_string())
            .with_timeout(Duration::from_millis(300));

        // Accept and hold the socket without ever reading from it
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        // Large enough to fill both socket buffers
        let payload = vec![b'x'; 64 * 1024 * 1024];
        let result = tokio::time::timeout(Duration::from_secs(5), transport.send(&payload))
            .await
            .expect("send must honour its own timeout");
        assert_eq!(result, Err(TransportError::Timeout));
        assert!(transport.stream.lock().await.is_none());

        server.abort();
    }

    #[tokio::test]
    async fn test_reconnects_after_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let transport = TcpTransport::new(listener.local_addr().unwrap().to_string());

        transport.send(b"{\"n\":1}").await.unwrap();
        let (first, _) = listener.accept().await.unwrap();
        drop(first);

        // Writes to a closed peer fail once the reset is seen, then the
        // transport reconnects.
        let mut failed = false;
        for _ in 0..20 {
            if transport.send(b"{\"n\":2}").await.is_err() {
                failed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(failed);

        transport.send(b"{\"n\":3}").await.unwrap();
        let (second, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(second).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("{\"n\":3}"));
    }
}
