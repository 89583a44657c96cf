//! Error types for transports.

use faultwatch_sdk::TransportError;
use thiserror::Error;

/// Errors that can occur while building or using a transport.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// WebSocket handshake or protocol failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The endpoint cannot be used by this transport.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(feature = "ws")]
impl From<tokio_tungstenite::tungstenite::Error> for AdapterError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;

        match err {
            Error::Io(e) => AdapterError::Io(e),
            Error::ConnectionClosed | Error::AlreadyClosed => {
                AdapterError::Connection("connection closed".to_string())
            }
            other => AdapterError::WebSocket(other.to_string()),
        }
    }
}

impl From<AdapterError> for TransportError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Timeout => TransportError::Timeout,
            AdapterError::Connection(msg) => TransportError::Connection(msg),
            AdapterError::Io(e) => TransportError::Connection(e.to_string()),
            AdapterError::Http(msg)
            | AdapterError::WebSocket(msg)
            | AdapterError::InvalidEndpoint(msg) => {
                TransportError::Request(msg)
            }
        }
    }
}
