//! CLI interface for chain-capture
//!
//! Provides subcommands for:
//! - `run`: Start the polling capture loop
//! - `fetch`: Record exactly one snapshot
//! - `export`: Flatten the latest snapshot to CSV
//! - `status`: Show capture file state
//! - `config`: Show configuration

mod export;
mod fetch;
mod run;

pub use export::ExportArgs;
pub use fetch::FetchArgs;
pub use run::RunArgs;

use crate::api::{UpstoxClient, UpstoxConfig};
use crate::config::{load_token, Config};
use crate::store::SnapshotStore;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "chain-capture")]
#[command(about = "Polling snapshot recorder for Upstox NSE option chains")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the polling capture loop
    Run(RunArgs),
    /// Record exactly one snapshot
    Fetch(FetchArgs),
    /// Flatten the latest snapshot to CSV
    Export(ExportArgs),
    /// Show capture file state
    Status,
    /// Show configuration
    Config,
}

/// Build an authenticated client from the configuration
pub(crate) fn build_client(config: &Config) -> anyhow::Result<UpstoxClient> {
    let token = load_token(&config.api)?;
    let api = UpstoxConfig {
        base_url: config.api.base_url.clone(),
        instrument_key: config.api.instrument_key.clone(),
        timeout: Duration::from_secs(config.api.timeout_secs),
    };
    Ok(UpstoxClient::with_config(api, token))
}

/// Build the snapshot store from the configuration
pub(crate) fn build_store(config: &Config) -> SnapshotStore {
    SnapshotStore::new(&config.storage.history_file, &config.storage.latest_file)
}

/// Parse a YYYY-MM-DD expiry argument
pub(crate) fn parse_expiry(raw: &str) -> anyhow::Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid expiry {:?} (expected YYYY-MM-DD): {}", raw, e))
}
