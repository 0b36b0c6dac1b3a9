//! Ingester Metrics
//!
//! Counters recorded through the `metrics` facade. They are no-ops until
//! an exporter is installed.

use metrics::counter;

/// Record a tick appended to the stream.
pub fn record_published(symbol: &str) {
    counter!(
        "price_ingester_ticks_published_total",
        "symbol" => symbol.to_string()
    )
    .increment(1);
}

/// Record a failed publish.
pub fn record_publish_error(reason: &'static str) {
    counter!(
        "price_ingester_publish_errors_total",
        "reason" => reason
    )
    .increment(1);
}
