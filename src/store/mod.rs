//! Snapshot storage module
//!
//! Append-only JSONL history plus an atomically-replaced latest file

mod recorder;
mod snapshot;

pub use recorder::{SnapshotStore, StoreError, StoreStats};
pub use snapshot::Snapshot;
