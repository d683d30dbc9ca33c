//! Per-strike flattening of a chain payload
//!
//! The broker payload nests call/put market data and greeks per strike, with
//! key spellings that vary across API versions. Flattening is tolerant:
//! every recognized key that is present lands in a column, anything missing
//! or non-numeric becomes an empty cell.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

/// Quote columns for one side (call or put) of a strike
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideQuote {
    pub ltp: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub oi: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub iv: Option<Decimal>,
    pub delta: Option<Decimal>,
    pub gamma: Option<Decimal>,
    pub theta: Option<Decimal>,
    pub vega: Option<Decimal>,
    pub pop: Option<Decimal>,
}

/// One flattened row of the chain table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainRow {
    pub strike: Option<Decimal>,
    pub underlying: Option<String>,
    pub updated_at: Option<String>,
    pub call: SideQuote,
    pub put: SideQuote,
    /// call ltp + put ltp, missing sides treated as zero; set only when at
    /// least one side traded
    pub straddle_price: Option<Decimal>,
}

/// CSV column order, matching the flattened table
const CSV_HEADER: &str = "strike,underlying,updated_at,\
call_ltp,call_bid,call_ask,call_oi,call_volume,call_iv,call_delta,call_gamma,call_theta,call_vega,call_pop,\
put_ltp,put_bid,put_ask,put_oi,put_volume,put_iv,put_delta,put_gamma,put_theta,put_vega,put_pop,\
straddle_price";

/// Flatten a chain payload into rows sorted by strike.
///
/// Accepts either the bare payload or a `{"snapshot": ...}` record envelope.
pub fn flatten_chain(payload: &Value) -> Vec<ChainRow> {
    let payload = unwrap_envelope(payload);

    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut rows: Vec<ChainRow> = data
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let call = first_of(item, &["call_options", "CE", "call"]);
            let put = first_of(item, &["put_options", "PE", "put"]);

            let call = call.map(extract_side).unwrap_or_default();
            let put = put.map(extract_side).unwrap_or_default();
            let straddle_price = straddle(&call, &put);

            ChainRow {
                strike: first_of(item, &["strike_price", "strike", "strikePrice"])
                    .and_then(to_decimal),
                underlying: first_of(item, &["underlying", "instrument_key"])
                    .and_then(Value::as_str)
                    .map(str::to_string),
                updated_at: first_of(item, &["updated_at", "last_updated", "timestamp"])
                    .and_then(Value::as_str)
                    .map(str::to_string),
                call,
                put,
                straddle_price,
            }
        })
        .collect();

    rows.sort_by(|a, b| match (a.strike, b.strike) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows
}

/// Render rows as CSV with a fixed header, empty cells for missing values
pub fn to_csv(rows: &[ChainRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for row in rows {
        let side_cells = |s: &SideQuote| {
            [
                s.ltp, s.bid, s.ask, s.oi, s.volume, s.iv, s.delta, s.gamma, s.theta, s.vega,
                s.pop,
            ]
            .iter()
            .map(|v| dec_cell(*v))
            .collect::<Vec<_>>()
            .join(",")
        };

        let mut cells = vec![
            dec_cell(row.strike),
            str_cell(row.underlying.as_deref()),
            str_cell(row.updated_at.as_deref()),
        ];
        cells.push(side_cells(&row.call));
        cells.push(side_cells(&row.put));
        cells.push(dec_cell(row.straddle_price));

        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Peel off a `{"snapshot": ...}` record envelope, if present
fn unwrap_envelope(payload: &Value) -> &Value {
    match payload.get("snapshot") {
        Some(inner @ Value::Object(_)) => inner,
        _ => payload,
    }
}

/// First value present under any of the given keys
fn first_of<'a>(
    item: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| item.get(*k))
        .filter(|v| !v.is_null())
}

/// Extract the quote columns from one side object
fn extract_side(side: &Value) -> SideQuote {
    let Some(side) = side.as_object() else {
        return SideQuote::default();
    };

    let md = first_of(side, &["market_data", "marketData"])
        .and_then(Value::as_object);
    let og = first_of(side, &["option_greeks", "greeks"])
        .and_then(Value::as_object);

    let md_field = |keys: &[&str]| md.and_then(|m| first_of(m, keys)).and_then(to_decimal);
    let og_field = |keys: &[&str]| og.and_then(|g| first_of(g, keys)).and_then(to_decimal);

    SideQuote {
        ltp: md_field(&["ltp", "last_price", "lastTradedPrice"]),
        bid: md_field(&["bid", "best_bid"]),
        ask: md_field(&["ask", "best_ask"]),
        oi: md_field(&["oi", "open_interest"]),
        volume: md_field(&["volume", "traded_volume"]),
        iv: og_field(&["iv", "implied_volatility"]),
        delta: og_field(&["delta"]),
        gamma: og_field(&["gamma"]),
        theta: og_field(&["theta"]),
        vega: og_field(&["vega"]),
        pop: og_field(&["pop"]).or_else(|| first_of(side, &["pop"]).and_then(to_decimal)),
    }
}

/// Straddle price when at least one side has a last trade
fn straddle(call: &SideQuote, put: &SideQuote) -> Option<Decimal> {
    if call.ltp.is_none() && put.ltp.is_none() {
        return None;
    }
    Some(call.ltp.unwrap_or_default() + put.ltp.unwrap_or_default())
}

/// Coerce a JSON number or numeric string to Decimal
fn to_decimal(v: &Value) -> Option<Decimal> {
    let raw = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

fn dec_cell(v: Option<Decimal>) -> String {
    v.map(|d| d.to_string()).unwrap_or_default()
}

fn str_cell(v: Option<&str>) -> String {
    match v {
        Some(s) if s.contains(',') || s.contains('"') => {
            format!("\"{}\"", s.replace('"', "\"\""))
        }
        Some(s) => s.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "status": "success",
            "data": [
                {
                    "strike_price": 24200,
                    "underlying": "NSE_INDEX|Nifty 50",
                    "updated_at": "2026-08-06T10:15:00Z",
                    "call_options": {
                        "market_data": {"ltp": 91.5, "bid": 91.0, "ask": 92.0, "oi": 120000, "volume": 54000},
                        "option_greeks": {"iv": 12.4, "delta": 0.48, "gamma": 0.002, "theta": -9.1, "vega": 11.2, "pop": 44.0}
                    },
                    "put_options": {
                        "market_data": {"ltp": 88.0, "bid": 87.5, "ask": 88.6, "oi": 98000, "volume": 61000},
                        "option_greeks": {"iv": 13.1, "delta": -0.52, "gamma": 0.002, "theta": -8.7, "vega": 11.0, "pop": 47.5}
                    }
                },
                {
                    "strike_price": 24000,
                    "underlying": "NSE_INDEX|Nifty 50",
                    "call_options": {
                        "market_data": {"ltp": 210.0}
                    },
                    "put_options": {}
                }
            ]
        })
    }

    #[test]
    fn test_flatten_sorts_by_strike() {
        let rows = flatten_chain(&sample_payload());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strike, Some(dec!(24000)));
        assert_eq!(rows[1].strike, Some(dec!(24200)));
    }

    #[test]
    fn test_flatten_extracts_both_sides() {
        let rows = flatten_chain(&sample_payload());
        let row = &rows[1];

        assert_eq!(row.call.ltp, Some(dec!(91.5)));
        assert_eq!(row.call.oi, Some(dec!(120000)));
        assert_eq!(row.call.delta, Some(dec!(0.48)));
        assert_eq!(row.put.ltp, Some(dec!(88.0)));
        assert_eq!(row.put.iv, Some(dec!(13.1)));
        assert_eq!(row.underlying.as_deref(), Some("NSE_INDEX|Nifty 50"));
        assert_eq!(row.updated_at.as_deref(), Some("2026-08-06T10:15:00Z"));
    }

    #[test]
    fn test_straddle_price() {
        let rows = flatten_chain(&sample_payload());
        // both sides traded
        assert_eq!(rows[1].straddle_price, Some(dec!(179.5)));
        // only the call traded: put treated as zero
        assert_eq!(rows[0].straddle_price, Some(dec!(210.0)));
    }

    #[test]
    fn test_straddle_absent_when_nothing_traded() {
        let payload = json!({"data": [{"strike_price": 24000, "call_options": {}, "put_options": {}}]});
        let rows = flatten_chain(&payload);
        assert_eq!(rows[0].straddle_price, None);
    }

    #[test]
    fn test_alternate_key_spellings() {
        let payload = json!({
            "data": [{
                "strikePrice": "24500",
                "instrument_key": "NSE_INDEX|Nifty 50",
                "CE": {
                    "marketData": {"last_price": "12.25", "best_bid": 12.0, "best_ask": 12.5, "open_interest": 500, "traded_volume": 900},
                    "greeks": {"implied_volatility": 14.0}
                },
                "PE": {
                    "marketData": {"lastTradedPrice": 310.4}
                }
            }]
        });

        let rows = flatten_chain(&payload);
        let row = &rows[0];
        assert_eq!(row.strike, Some(dec!(24500)));
        assert_eq!(row.underlying.as_deref(), Some("NSE_INDEX|Nifty 50"));
        assert_eq!(row.call.ltp, Some(dec!(12.25)));
        assert_eq!(row.call.bid, Some(dec!(12.0)));
        assert_eq!(row.call.oi, Some(dec!(500)));
        assert_eq!(row.call.iv, Some(dec!(14.0)));
        assert_eq!(row.put.ltp, Some(dec!(310.4)));
    }

    #[test]
    fn test_snapshot_envelope_unwrapped() {
        let envelope = json!({
            "timestamp_utc": "2026-08-06T10:15:00Z",
            "snapshot": sample_payload()
        });

        let rows = flatten_chain(&envelope);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_non_numeric_cells_become_empty() {
        let payload = json!({
            "data": [{
                "strike_price": 24000,
                "call_options": {"market_data": {"ltp": "n/a", "bid": true}}
            }]
        });

        let rows = flatten_chain(&payload);
        assert_eq!(rows[0].call.ltp, None);
        assert_eq!(rows[0].call.bid, None);
    }

    #[test]
    fn test_scientific_notation_coerced() {
        let payload = json!({
            "data": [{
                "strike_price": 24000,
                "call_options": {"option_greeks": {"gamma": 2.1e-4}}
            }]
        });

        let rows = flatten_chain(&payload);
        assert_eq!(rows[0].call.gamma, Some(dec!(0.00021)));
    }

    #[test]
    fn test_empty_or_malformed_payloads() {
        assert!(flatten_chain(&json!({})).is_empty());
        assert!(flatten_chain(&json!({"data": "oops"})).is_empty());
        assert!(flatten_chain(&json!(null)).is_empty());
        // non-object items are skipped
        let rows = flatten_chain(&json!({"data": [1, "x", {"strike_price": 24000}]}));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_csv_shape() {
        let rows = flatten_chain(&sample_payload());
        let csv = to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strike,underlying,updated_at,call_ltp"));
        assert!(lines[0].ends_with("straddle_price"));
        // every line has the same number of cells as the header
        let width = lines[0].split(',').count();
        assert_eq!(lines[1].split(',').count(), width);
        assert_eq!(lines[2].split(',').count(), width);
        assert!(lines[2].starts_with("24200,"));
    }

    #[test]
    fn test_csv_empty_rows() {
        let csv = to_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
    }
}
