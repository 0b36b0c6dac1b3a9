//! Prometheus Metrics
//!
//! Installs the Prometheus exporter and registers the metric descriptions
//! shared by the pipeline. Each binary records its own counters through
//! the `metrics` facade; this module only owns the exporter and the
//! stream-level counters.
//!
//! # Integration
//!
//! When enabled, metrics are served at `http://<addr>/metrics`.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Listen on all interfaces at `port`.
    #[must_use]
    pub const fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Start the Prometheus HTTP exporter.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    register_metrics();

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter started");
    Ok(())
}

fn register_metrics() {
    describe_counter!(
        "price_stream_connect_attempts_total",
        "Redis connection attempts made at startup"
    );
    describe_counter!(
        "price_ingester_ticks_published_total",
        "Ticks appended to the stream"
    );
    describe_counter!(
        "price_ingester_publish_errors_total",
        "Tick appends that failed"
    );
    describe_counter!(
        "spike_analyzer_entries_total",
        "Stream entries processed by outcome"
    );
    describe_counter!(
        "spike_analyzer_read_errors_total",
        "Transient stream read failures"
    );
}

/// Record one connection attempt.
pub fn record_connect_attempt() {
    counter!("price_stream_connect_attempts_total").increment(1);
}
