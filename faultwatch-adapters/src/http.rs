//! HTTP transport for the fault API.
//!
//! Each report is sent as one `POST` with a JSON body. When an API key is
//! configured it travels in the `x-api-key` header. Any response status is
//! handed back to the dispatcher, which decides whether it counts as
//! delivered.
//!
//! ## Example
//!
//! ```rust,no_run
//! use faultwatch_adapters::http::HttpTransport;
//! use faultwatch_sdk::Transport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::builder()
//!         .endpoint("http://localhost:3000/api/fault/esp32")
//!         .api_key("secret")
//!         .build()?;
//!
//!     let status = transport
//!         .send(br#"{"fault-type":"normal","light-ID":"l1","timestamp":"2024-01-01T00:00:00Z"}"#)
//!         .await?;
//!     println!("status: {:?}", status);
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use faultwatch_sdk::{Transport, TransportError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::endpoint::without_userinfo;
use crate::AdapterError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Default fault API endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/fault/esp32";

/// Posts reports to an HTTP endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    description: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, payload: &[u8]) -> Result<u16, AdapterError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec());

        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        // The body is informational only
        match response.text().await {
            Ok(body) => debug!(status, body = %body, "Fault API response"),
            Err(e) => debug!(status, error = %e, "Fault API response body unreadable"),
        }

        Ok(status)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &[u8]) -> Result<Option<u16>, TransportError> {
        Ok(Some(self.post(payload).await?))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.description)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builder for HttpTransport.
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Set the endpoint URL (default: `http://localhost:3000/api/fault/esp32`).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key. An empty key sends no header.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|k| !k.is_empty());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, AdapterError> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AdapterError::InvalidEndpoint(format!(
                "'{}' is not an http(s) URL",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .build()?;

        Ok(HttpTransport {
            client,
            description: without_userinfo(&endpoint),
            endpoint,
            api_key: self.api_key,
        })
    }
}
