//! WebSocket transport.
//!
//! Each payload is sent as one text frame over a persistent `ws://` or
//! `wss://` connection, the way the bench WebSocket collector expects it.
//! The connection is opened on first use and reopened after a failure or a
//! close from the server. Frames the server sends back (echoes, pings) are
//! consumed after each send so they never pile up in the socket.
//!
//! ## Example
//!
//! ```rust,no_run
//! use faultwatch_adapters::ws::WsTransport;
//! use faultwatch_sdk::Transport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = WsTransport::builder().url("ws://10.0.0.5:8080").build()?;
//!     transport.send(br#"{"voltage":1.65}"#).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use faultwatch_sdk::{Transport, TransportError};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::endpoint::without_userinfo;
use crate::AdapterError;

/// Default collector URL.
pub const DEFAULT_URL: &str = "ws://localhost:8080";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Sends payloads as WebSocket text frames.
pub struct WsTransport {
    url: String,
    description: String,
    timeout: Duration,
    socket: Mutex<Option<Socket>>,
}

impl WsTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> WsTransportBuilder {
        WsTransportBuilder::default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<Socket, AdapterError> {
        match tokio::time::timeout(self.timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((socket, _response))) => {
                info!(url = %self.description, "WebSocket connected");
                Ok(socket)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(AdapterError::Timeout),
        }
    }

    async fn send_text(&self, payload: &[u8]) -> Result<(), AdapterError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| AdapterError::WebSocket(format!("payload is not UTF-8: {}", e)))?
            .to_owned();

        let mut guard = self.socket.lock().await;
        let mut socket = match guard.take() {
            Some(socket) => socket,
            None => self.connect().await?,
        };

        match tokio::time::timeout(self.timeout, socket.send(Message::Text(text))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(url = %self.description, error = %e, "WebSocket disconnected");
                return Err(e.into());
            }
            Err(_) => {
                warn!(url = %self.description, timeout = ?self.timeout, "WebSocket send timed out");
                return Err(AdapterError::Timeout);
            }
        }

        if self.drain(&mut socket) {
            *guard = Some(socket);
        }
        Ok(())
    }

    /// Consume whatever the server has already sent without waiting.
    ///
    /// Returns false once the server has closed the connection.
    fn drain(&self, socket: &mut Socket) -> bool {
        while let Some(next) = socket.next().now_or_never() {
            match next {
                Some(Ok(Message::Close(_))) | None => {
                    info!(url = %self.description, "WebSocket closed by server");
                    return false;
                }
                Some(Ok(reply)) => debug!(url = %self.description, reply = %reply, "WebSocket reply"),
                Some(Err(e)) => {
                    warn!(url = %self.description, error = %e, "WebSocket disconnected");
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError> {
        self.send_text(payload).await?;
        Ok(None)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("url", &self.description)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for WsTransport.
#[derive(Debug, Default)]
pub struct WsTransportBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
}

impl WsTransportBuilder {
    /// Set the collector URL (default: `ws://localhost:8080`).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the connect and send timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport. Nothing is opened until the first send.
    pub fn build(self) -> Result<WsTransport, AdapterError> {
        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(AdapterError::InvalidEndpoint(format!(
                "'{}' is not a ws(s) URL",
                url
            )));
        }

        Ok(WsTransport {
            description: without_userinfo(&url),
            url,
            timeout: self.timeout.unwrap_or(Duration::from_secs(10)),
            socket: Mutex::new(None),
        })
    }
}
