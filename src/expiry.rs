//! Nearest-expiry selection from the contracts payload
//!
//! The contracts endpoint reports expiries under a handful of key spellings
//! depending on API version. Selection is tolerant: unparseable or missing
//! entries are skipped, past expiries are ignored, and the earliest remaining
//! date wins.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Key spellings under which a contract item may carry its expiry
const EXPIRY_KEYS: [&str; 4] = ["expiry_date", "expiry", "expiryDate", "date"];

/// Pick the nearest expiry on or after `today` from a contracts payload.
///
/// Returns None when the payload has no usable `data` array or no expiry
/// on/after the given date.
pub fn nearest_expiry(contracts: &Value, today: NaiveDate) -> Option<NaiveDate> {
    let data = contracts.get("data").and_then(Value::as_array)?;

    data.iter()
        .filter_map(item_expiry)
        .filter(|d| *d >= today)
        .min()
}

/// Extract the expiry date from one contract item, if any
fn item_expiry(item: &Value) -> Option<NaiveDate> {
    let raw = match item {
        Value::Object(map) => EXPIRY_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    parse_date(raw)
}

/// Parse a plain date or a full RFC 3339 timestamp
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}
