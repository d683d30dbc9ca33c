//! End-to-end capture tests: a scripted chain source driving the poller
//! through mixed success/failure ticks, checked against the on-disk files.

use async_trait::async_trait;
use chain_capture::api::ApiError;
use chain_capture::poller::{ChainSource, Poller, TickOutcome, TickStats};
use chain_capture::store::SnapshotStore;
use serde_json::{json, Value};
use std::sync::Mutex;
use tempfile::TempDir;

/// Chain source that replays a fixed script of per-tick results
struct ScriptedSource {
    script: Mutex<Vec<Result<Value, ()>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<Value, ()>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl ChainSource for ScriptedSource {
    async fn fetch_contracts(&self) -> Result<Value, ApiError> {
        Ok(json!({"data": [{"expiry_date": "2999-12-31"}]}))
    }

    async fn fetch_chain(&self, _expiry: &str) -> Result<Value, ApiError> {
        let next = self.script.lock().unwrap().remove(0);
        next.map_err(|_| ApiError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "scripted outage".to_string(),
        })
    }
}

fn chain(tag: u64) -> Value {
    json!({"status": "success", "data": [{"strike_price": tag}]})
}

fn store_in(dir: &TempDir) -> SnapshotStore {
    SnapshotStore::new(
        dir.path().join("history.jsonl"),
        dir.path().join("latest.json"),
    )
}

#[tokio::test]
async fn history_holds_exactly_the_successful_ticks_in_order() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new(vec![
        Ok(chain(1)),
        Err(()),
        Ok(chain(2)),
        Err(()),
        Err(()),
        Ok(chain(3)),
    ]);
    let mut poller = Poller::new(source, store_in(&dir));

    let mut stats = TickStats::default();
    for _ in 0..6 {
        let outcome = poller.tick().await;
        stats.observe(&outcome);
    }

    assert_eq!(stats.ticks, 6);
    assert_eq!(stats.recorded, 3);
    assert_eq!(stats.fetch_errors, 3);

    let history = poller.store().read_history().unwrap();
    let tags: Vec<u64> = history
        .iter()
        .map(|s| s.snapshot["data"][0]["strike_price"].as_u64().unwrap())
        .collect();
    assert_eq!(tags, vec![1, 2, 3]);
}

#[tokio::test]
async fn latest_tracks_the_last_history_line_after_each_success() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new(vec![Ok(chain(1)), Ok(chain(2)), Err(()), Ok(chain(3))]);
    let mut poller = Poller::new(source, store_in(&dir));

    for _ in 0..4 {
        let before = poller.store().history_len().unwrap();
        let outcome = poller.tick().await;
        let after = poller.store().history_len().unwrap();

        match outcome {
            TickOutcome::Recorded => {
                assert_eq!(after, before + 1, "successful tick appends exactly one line");
                let latest = poller.store().read_latest().unwrap().unwrap();
                let history = poller.store().read_history().unwrap();
                assert_eq!(&latest, history.last().unwrap());
            }
            _ => assert_eq!(after, before, "failed tick must not touch history"),
        }
    }
}

#[tokio::test]
async fn restart_against_existing_history_only_appends() {
    let dir = TempDir::new().unwrap();

    {
        let source = ScriptedSource::new(vec![Ok(chain(1)), Ok(chain(2))]);
        let mut poller = Poller::new(source, store_in(&dir));
        poller.tick().await;
        poller.tick().await;
    }

    let first_run_bytes = std::fs::read(dir.path().join("history.jsonl")).unwrap();

    {
        let source = ScriptedSource::new(vec![Ok(chain(3))]);
        let mut poller = Poller::new(source, store_in(&dir));
        poller.tick().await;
    }

    let second_run_bytes = std::fs::read(dir.path().join("history.jsonl")).unwrap();
    assert!(
        second_run_bytes.starts_with(&first_run_bytes),
        "prior lines must be preserved byte-for-byte"
    );
    assert!(second_run_bytes.len() > first_run_bytes.len());
}

#[tokio::test]
async fn failed_first_tick_creates_no_files() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new(vec![Err(())]);
    let mut poller = Poller::new(source, store_in(&dir));

    let outcome = poller.tick().await;
    assert!(matches!(outcome, TickOutcome::FetchSkipped(_)));
    assert!(!dir.path().join("history.jsonl").exists());
    assert!(!dir.path().join("latest.json").exists());
}
