//! Configuration types for chain-capture

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

/// Upstox REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, switch to the sandbox host for testing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Instrument key of the underlying (e.g. "NSE_INDEX|Nifty 50")
    #[serde(default = "default_instrument_key")]
    pub instrument_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File containing the bearer token; UPSTOX_ACCESS_TOKEN overrides it
    pub token_file: PathBuf,
}

/// Polling loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between ticks, clamped to a 2s floor
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Fixed expiry (YYYY-MM-DD); None means auto-resolve the nearest
    #[serde(default)]
    pub expiry: Option<String>,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Append-only JSONL history file
    pub history_file: PathBuf,

    /// Latest-snapshot file, overwritten each tick
    pub latest_file: PathBuf,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// 0 disables the Prometheus exporter
    #[serde(default)]
    pub metrics_port: u16,
}

fn default_base_url() -> String {
    "https://api.upstox.com".to_string()
}
fn default_instrument_key() -> String {
    "NSE_INDEX|Nifty 50".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_interval_secs() -> u64 {
    10
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            expiry: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective poll interval with the 2s floor applied
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll.interval_secs.max(2))
    }
}

/// Resolve the bearer token: environment first, then the configured file.
///
/// Mirrors the deployment convention where an injected secret overrides
/// whatever is on disk. Whitespace is trimmed either way.
pub fn load_token(api: &ApiConfig) -> anyhow::Result<String> {
    if let Ok(token) = std::env::var("UPSTOX_ACCESS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let raw = std::fs::read_to_string(&api.token_file).map_err(|e| {
        anyhow::anyhow!(
            "could not read token file {}: {}",
            api.token_file.display(),
            e
        )
    })?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("token file {} is empty", api.token_file.display());
    }
    Ok(token)
}
