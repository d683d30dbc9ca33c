//! Export command implementation
//!
//! Flattens the latest snapshot into the per-strike CSV table.

use super::build_store;
use crate::config::Config;
use crate::table::{flatten_chain, to_csv};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output CSV path; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = build_store(config);

        let latest = store
            .read_latest()?
            .ok_or_else(|| anyhow::anyhow!("no latest snapshot yet; run `fetch` or `run` first"))?;

        let rows = flatten_chain(&latest.snapshot);
        if rows.is_empty() {
            tracing::warn!("Latest snapshot flattened to zero strikes");
        }
        let csv = to_csv(&rows);

        match &self.output {
            Some(path) => {
                std::fs::write(path, csv)?;
                println!("Wrote {} strikes to {}", rows.len(), path.display());
            }
            None => print!("{}", csv),
        }
        Ok(())
    }
}
