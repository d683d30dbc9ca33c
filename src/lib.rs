//! chain-capture: polling snapshot recorder for Upstox NSE option chains
//!
//! This library provides the core components for:
//! - Authenticated REST access to the option contract and chain endpoints
//! - Nearest-expiry discovery from the contracts payload
//! - Durable snapshot recording (JSONL history + atomic latest file)
//! - A fixed-interval polling loop with per-tick error isolation
//! - Flattening a chain payload into a per-strike table / CSV
//! - Structured logging and Prometheus metrics

pub mod api;
pub mod cli;
pub mod config;
pub mod expiry;
pub mod poller;
pub mod store;
pub mod table;
pub mod telemetry;
