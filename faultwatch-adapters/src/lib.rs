//! # faultwatch-adapters
//!
//! Ready-made [`Transport`](faultwatch_sdk::Transport) implementations for
//! delivering fault reports.
//!
//! ## Supported Transports
//!
//! - **HTTP** (`http` feature) - `POST`s each report as JSON, with an
//!   optional `x-api-key` header, and returns the response status
//! - **TCP** (`tcp` feature) - Streams newline-delimited JSON over a
//!   persistent connection
//! - **WebSocket** (`ws` feature) - Sends each payload as a text frame over a
//!   persistent `ws://` or `wss://` connection
//!
//! Every transport bounds each send by its timeout (10 seconds by default).
//!
//! ## Quick Start (HTTP)
//!
//! ```rust,no_run
//! use faultwatch_adapters::http::HttpTransport;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::builder()
//!     .endpoint("http://192.168.1.100:3000/api/fault/esp32")
//!     .api_key("secret")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

#[cfg(any(feature = "http", feature = "ws"))]
mod endpoint;
pub mod error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "ws")]
pub mod ws;

pub use error::AdapterError;

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "tcp")]
pub use tcp::TcpTransport;

#[cfg(feature = "ws")]
pub use ws::WsTransport;
