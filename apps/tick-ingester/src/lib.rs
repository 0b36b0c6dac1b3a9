#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp))]

//! Tick Ingester - Synthetic Price Feed
//!
//! Produces a steady synthetic load for the spike pipeline: once per
//! interval it draws a symbol and a price at random, encodes the tick and
//! appends it to the shared stream.
//!
//! - `generator`: Random tick source over a fixed symbol universe
//! - `ingester`: The publish loop and its single-shot `tick` operation
//! - `config`: Environment-driven settings
//! - `metrics`: Publish counters

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Environment-driven settings.
pub mod config;

/// Random tick source.
pub mod generator;

/// Publish loop.
pub mod ingester;

/// Publish counters.
pub mod metrics;

pub use config::IngesterConfig;
pub use generator::{GeneratorError, TickGenerator};
pub use ingester::{Ingester, IngesterStats, PublishError, Published};
