//! Upstox API client for option contract and chain data
//!
//! Both endpoints are bearer-token authenticated GETs returning a JSON body
//! wrapped as {"data": [...]}. The payload is kept as raw `serde_json::Value`
//! so a schema drift on the broker side never breaks capture.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Upstox API base URL
pub const UPSTOX_API_URL: &str = "https://api.upstox.com";

/// API errors, classified so the poller can skip the tick and keep going
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid JSON in response body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Configuration for the Upstox client
#[derive(Debug, Clone)]
pub struct UpstoxConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Instrument key of the underlying
    pub instrument_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for UpstoxConfig {
    fn default() -> Self {
        Self {
            base_url: UPSTOX_API_URL.to_string(),
            instrument_key: "NSE_INDEX|Nifty 50".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the Upstox option endpoints
pub struct UpstoxClient {
    config: UpstoxConfig,
    client: Client,
    token: String,
}

impl UpstoxClient {
    /// Create a new client with default configuration
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(UpstoxConfig::default(), token)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: UpstoxConfig, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            token: token.into(),
        }
    }

    /// Instrument key this client polls
    pub fn instrument_key(&self) -> &str {
        &self.config.instrument_key
    }

    /// Fetch the option contracts for the configured instrument
    ///
    /// Used for expiry discovery; the payload is returned as-is.
    pub async fn fetch_contracts(&self) -> Result<Value, ApiError> {
        let url = format!("{}/v2/option/contract", self.config.base_url);

        tracing::debug!(url = %url, instrument = %self.config.instrument_key, "Fetching option contracts");

        self.get_json(&url, &[("instrument_key", self.config.instrument_key.as_str())])
            .await
    }

    /// Fetch the option chain for one expiry
    pub async fn fetch_chain(&self, expiry: &str) -> Result<Value, ApiError> {
        let url = format!("{}/v2/option/chain", self.config.base_url);

        tracing::debug!(url = %url, expiry = %expiry, "Fetching option chain");

        self.get_json(
            &url,
            &[
                ("instrument_key", self.config.instrument_key.as_str()),
                ("expiry_date", expiry),
            ],
        )
        .await
    }

    /// Issue one GET and decode the body, preserving error detail
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
