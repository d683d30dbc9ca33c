//! Snapshot wire type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timestamped capture of the option-chain payload.
///
/// The payload stays opaque JSON; field names are the on-disk wire format
/// shared by the history lines and the latest file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Capture time, UTC
    pub timestamp_utc: DateTime<Utc>,
    /// Raw chain payload as returned by the API
    pub snapshot: Value,
}

impl Snapshot {
    /// Wrap a payload captured now
    pub fn new(payload: Value) -> Self {
        Self::at(Utc::now(), payload)
    }

    /// Wrap a payload with an explicit capture time
    pub fn at(timestamp_utc: DateTime<Utc>, payload: Value) -> Self {
        Self {
            timestamp_utc,
            snapshot: payload,
        }
    }
}
