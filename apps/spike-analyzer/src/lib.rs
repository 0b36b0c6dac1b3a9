#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp))]

//! Spike Analyzer - Price Change Classifier
//!
//! Consumes the price stream from the moment it starts and classifies each
//! tick against the last price seen for the same symbol:
//!
//! ```text
//! change = (new - old) / old
//! |change| >  threshold  →  spike
//! |change| <= threshold  →  stable
//! no prior price         →  first observation
//! ```
//!
//! - `detector`: Last-price table and the classification rule
//! - `tail`: Cursor-tracking reader over the stream port
//! - `analyzer`: The consume loop
//! - `config`: Environment-driven settings
//! - `metrics`: Classification counters

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Consume loop.
pub mod analyzer;

/// Environment-driven settings.
pub mod config;

/// Spike classification.
pub mod detector;

/// Classification counters.
pub mod metrics;

/// Cursor-tracking stream reader.
pub mod tail;

pub use analyzer::{Analyzer, AnalyzerStats};
pub use config::AnalyzerConfig;
pub use detector::{
    DEFAULT_SPIKE_THRESHOLD, LastPriceTable, Observation, Outcome, SpikeAlert, SpikeDetector,
    relative_change,
};
pub use tail::StreamTail;
