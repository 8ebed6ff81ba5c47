/*
[INPUT]:  Base URL and ClientConfig timeouts
[OUTPUT]: MercoClient with REST and streaming reqwest clients plus JSON send helper
[POS]:    HTTP layer - shared client plumbing for endpoint groups
[UPDATE]: When adding connection options or changing response decoding
*/

use crate::http::{MercoError, Result};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default address of a locally running backtest service
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for the Merco backtest API
#[derive(Debug, Clone)]
pub struct MercoClient {
    http_client: Client,
    stream_client: Client,
    base_url: Url,
}

impl MercoClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(MercoError::Config(format!(
                "unsupported base url scheme: {}",
                base_url.scheme()
            )));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        // The task stream is long-lived, so only the connect phase is bounded.
        let stream_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            stream_client,
            base_url,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint
    pub(crate) fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }

    /// Build request builder for an API endpoint
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> std::result::Result<RequestBuilder, url::ParseError> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder for a streaming endpoint (no total timeout)
    pub(crate) fn stream_request(
        &self,
        endpoint: &str,
    ) -> std::result::Result<RequestBuilder, url::ParseError> {
        let url = self.url(endpoint)?;
        Ok(self.stream_client.get(url))
    }

    /// Send a request and decode a JSON body, mapping non-2xx statuses to `MercoError::Api`
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MercoError::api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(MercoError::from)
    }
}
