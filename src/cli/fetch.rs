//! Fetch command implementation
//!
//! One-shot capture: exactly one tick, non-zero exit if nothing was recorded.

use super::{build_client, build_store, parse_expiry};
use crate::config::Config;
use crate::poller::{Poller, TickOutcome};
use clap::Args;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Expiry date YYYY-MM-DD (overrides config and auto-resolution)
    #[arg(short, long)]
    pub expiry: Option<String>,
}

impl FetchArgs {
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

        match poller.tick().await {
            TickOutcome::Recorded => {
                println!(
                    "Saved snapshot to {} and {}",
                    poller.store().history_file().display(),
                    poller.store().latest_file().display()
                );
                Ok(())
            }
            TickOutcome::NoExpiry => {
                anyhow::bail!("no expiry on or after today; pass --expiry or check the token")
            }
            TickOutcome::FetchSkipped(e) => Err(anyhow::anyhow!(e).context("fetch failed")),
            TickOutcome::StoreFailed(e) => Err(anyhow::anyhow!(e).context("write failed")),
        }
    }
}
