//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Per-tick counter types
#[derive(Debug, Clone, Copy)]
pub enum TickMetric {
    /// Snapshot recorded to both files
    Recorded,
    /// Fetch failed or no expiry; tick skipped
    FetchError,
    /// Fetch succeeded, file write failed
    StoreError,
}

/// Increment the counter for one tick outcome
pub fn record_tick(metric: TickMetric) {
    let metric_name = match metric {
        TickMetric::Recorded => "chaincap_ticks_recorded_total",
        TickMetric::FetchError => "chaincap_fetch_errors_total",
        TickMetric::StoreError => "chaincap_store_errors_total",
    };

    metrics::counter!(metric_name).increment(1);
}

/// Set the history line-count gauge
pub fn set_history_lines(lines: u64) {
    metrics::gauge!("chaincap_history_lines").set(lines as f64);
}

/// Start the Prometheus scrape endpoint on the given port
pub(crate) fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}
