//! Fixed-interval polling loop
//!
//! One tick runs to completion (resolve expiry, fetch, record) before the
//! next interval wait begins. A failed fetch skips the tick and touches
//! neither file; the loop only stops on ctrl-c. All loop state is explicit:
//! counters live in `TickStats`, the current expiry on the `Poller`.

use crate::api::{ApiError, UpstoxClient};
use crate::expiry::nearest_expiry;
use crate::store::{Snapshot, SnapshotStore, StoreError};
use crate::telemetry::{record_tick, set_history_lines, TickMetric};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Trait for chain data sources
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Fetch the contracts payload (expiry discovery)
    async fn fetch_contracts(&self) -> Result<Value, ApiError>;

    /// Fetch the chain payload for one expiry (YYYY-MM-DD)
    async fn fetch_chain(&self, expiry: &str) -> Result<Value, ApiError>;
}

#[async_trait]
impl ChainSource for UpstoxClient {
    async fn fetch_contracts(&self) -> Result<Value, ApiError> {
        UpstoxClient::fetch_contracts(self).await
    }

    async fn fetch_chain(&self, expiry: &str) -> Result<Value, ApiError> {
        UpstoxClient::fetch_chain(self, expiry).await
    }
}

/// Result of one tick
#[derive(Debug)]
pub enum TickOutcome {
    /// Snapshot appended to history and written to latest
    Recorded,
    /// Fetch failed (transport, non-2xx, bad JSON); nothing written
    FetchSkipped(ApiError),
    /// No usable expiry could be resolved; nothing written
    NoExpiry,
    /// Fetch succeeded but a file write failed
    StoreFailed(StoreError),
}

/// Loop-local tick counters
#[derive(Debug, Default, Clone)]
pub struct TickStats {
    pub ticks: u64,
    pub recorded: u64,
    pub fetch_errors: u64,
    pub store_errors: u64,
}

impl TickStats {
    /// Fold one outcome into the counters
    pub fn observe(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Recorded => self.recorded += 1,
            TickOutcome::FetchSkipped(_) | TickOutcome::NoExpiry => self.fetch_errors += 1,
            TickOutcome::StoreFailed(_) => self.store_errors += 1,
        }
    }
}

/// Polls a chain source and records each snapshot
pub struct Poller<S> {
    source: S,
    store: SnapshotStore,
    expiry: Option<NaiveDate>,
    fixed_expiry: bool,
}

impl<S: ChainSource> Poller<S> {
    /// Create a poller that auto-resolves the nearest expiry
    pub fn new(source: S, store: SnapshotStore) -> Self {
        Self {
            source,
            store,
            expiry: None,
            fixed_expiry: false,
        }
    }

    /// Create a poller pinned to a fixed expiry
    pub fn with_expiry(source: S, store: SnapshotStore, expiry: NaiveDate) -> Self {
        Self {
            source,
            store,
            expiry: Some(expiry),
            fixed_expiry: true,
        }
    }

    /// Currently resolved expiry, if any
    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    /// Underlying store
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Resolve the expiry when unset or already past (auto mode only).
    ///
    /// Long captures cross expiries; a pinned expiry is never second-guessed.
    async fn ensure_expiry(&mut self) -> Result<Option<NaiveDate>, ApiError> {
        if self.fixed_expiry {
            return Ok(self.expiry);
        }

        let today = Utc::now().date_naive();
        if self.expiry.map_or(true, |e| e < today) {
            let contracts = self.source.fetch_contracts().await?;
            self.expiry = nearest_expiry(&contracts, today);
            if let Some(expiry) = self.expiry {
                tracing::info!(expiry = %expiry, "Resolved nearest expiry");
            }
        }
        Ok(self.expiry)
    }

    /// Execute one tick: resolve expiry, fetch, stamp, record
    pub async fn tick(&mut self) -> TickOutcome {
        let expiry = match self.ensure_expiry().await {
            Ok(Some(expiry)) => expiry,
            Ok(None) => {
                tracing::warn!("No expiry on or after today, skipping tick");
                return TickOutcome::NoExpiry;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Contract fetch failed, skipping tick");
                return TickOutcome::FetchSkipped(e);
            }
        };

        let payload = match self.source.fetch_chain(&expiry.to_string()).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, expiry = %expiry, "Chain fetch failed, skipping tick");
                return TickOutcome::FetchSkipped(e);
            }
        };

        let snapshot = Snapshot::new(payload);
        match self.store.record(&snapshot) {
            Ok(()) => {
                tracing::info!(
                    expiry = %expiry,
                    timestamp = %snapshot.timestamp_utc,
                    "Recorded snapshot"
                );
                TickOutcome::Recorded
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to record snapshot");
                TickOutcome::StoreFailed(e)
            }
        }
    }

    /// Run the polling loop until ctrl-c; returns the final counters
    pub async fn run(&mut self, interval: Duration) -> anyhow::Result<TickStats> {
        let mut stats = TickStats::default();
        let mut history_lines = self.store.history_len().unwrap_or(0) as u64;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = interval.as_secs(),
            history = ?self.store.history_file(),
            latest = ?self.store.latest_file(),
            "Starting capture loop"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.tick().await;
                    stats.observe(&outcome);

                    match &outcome {
                        TickOutcome::Recorded => {
                            history_lines += 1;
                            record_tick(TickMetric::Recorded);
                            set_history_lines(history_lines);
                        }
                        TickOutcome::FetchSkipped(_) | TickOutcome::NoExpiry => {
                            record_tick(TickMetric::FetchError);
                        }
                        TickOutcome::StoreFailed(_) => {
                            record_tick(TickMetric::StoreError);
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(
                        ticks = stats.ticks,
                        recorded = stats.recorded,
                        fetch_errors = stats.fetch_errors,
                        store_errors = stats.store_errors,
                        "Capture loop shutting down"
                    );
                    break;
                }
            }
        }

        Ok(stats)
    }
}
