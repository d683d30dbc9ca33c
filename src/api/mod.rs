//! Upstox REST API module
//!
//! Authenticated access to the option contract and chain endpoints

mod client;

pub use client::{ApiError, UpstoxClient, UpstoxConfig, UPSTOX_API_URL};
