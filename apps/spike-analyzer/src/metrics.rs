//! Analyzer Metrics

use metrics::counter;

/// Record a processed entry by outcome (`spike`, `stable`, `first` or
/// `malformed`).
pub fn record_entry(outcome: &'static str) {
    counter!("spike_analyzer_entries_total", "outcome" => outcome).increment(1);
}

/// Record a failed stream read.
pub fn record_read_error() {
    counter!("spike_analyzer_read_errors_total").increment(1);
}
