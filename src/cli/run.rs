//! Run command implementation

use super::{build_client, build_store, parse_expiry};
use crate::config::Config;
use crate::poller::Poller;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Poll interval in seconds (overrides config, 2s floor)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Expiry date YYYY-MM-DD (overrides config and auto-resolution)
    #[arg(short, long)]
    pub expiry: Option<String>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = build_client(config)?;
        let store = build_store(config);

        let expiry = self
            .expiry
            .as_deref()
            .or(config.poll.expiry.as_deref())
            .map(parse_expiry)
            .transpose()?;

        let mut poller = match expiry {
            Some(expiry) => Poller::with_expiry(client, store, expiry),
            None => Poller::new(client, store),
        };

        let interval = match self.interval {
            Some(secs) => Duration::from_secs(secs.max(2)),
            None => config.poll_interval(),
        };

        let stats = poller.run(interval).await?;
        tracing::info!(
            ticks = stats.ticks,
            recorded = stats.recorded,
            "Capture finished"
        );
        Ok(())
    }
}
