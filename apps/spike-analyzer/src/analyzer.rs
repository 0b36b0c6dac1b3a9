//! Consume Loop
//!
//! Tails the stream and feeds every entry, in arrival order, through the
//! spike detector. A malformed entry is logged and skipped; a failed read
//! is logged, counted and retried after a short pause. Both waits are
//! raced against the shutdown token.

use std::time::Duration;

use price_stream::{EntryError, EventStream, StreamEntry, StreamError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::detector::{Observation, SpikeDetector};
use crate::metrics::{record_entry, record_read_error};
use crate::tail::StreamTail;

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    /// Entries received from the stream.
    pub entries: u64,
    /// Ticks classified as spikes.
    pub spikes: u64,
    /// Ticks classified as stable.
    pub stable: u64,
    /// First ticks for a symbol.
    pub first: u64,
    /// Entries that could not be decoded.
    pub malformed: u64,
    /// Failed reads.
    pub read_errors: u64,
}

/// Spike analyzer over an [`EventStream`].
#[derive(Debug)]
pub struct Analyzer<S> {
    tail: StreamTail<S>,
    detector: SpikeDetector,
    payload_field: String,
    error_backoff: Duration,
    stats: AnalyzerStats,
}

impl<S: EventStream> Analyzer<S> {
    /// Subscribe to the current end of `stream` with an empty price table.
    pub async fn start(stream: S, config: &AnalyzerConfig) -> Self {
        let tail = StreamTail::subscribe(stream, config.block, config.batch_size).await;

        Self {
            tail,
            detector: SpikeDetector::new(config.spike_threshold),
            payload_field: config.stream.payload_field.clone(),
            error_backoff: config.error_backoff,
            stats: AnalyzerStats::default(),
        }
    }

    /// The detector and its last-price table.
    #[must_use]
    pub const fn detector(&self) -> &SpikeDetector {
        &self.detector
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    /// The tail this analyzer reads from.
    #[must_use]
    pub const fn tail(&self) -> &StreamTail<S> {
        &self.tail
    }

    /// Classify one entry.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if the payload is missing, not text, or not a
    /// valid tick. The price table is not touched in that case.
    pub fn process_entry(&mut self, entry: &StreamEntry) -> Result<Observation, EntryError> {
        self.stats.entries += 1;

        let tick = match entry.decode_tick(&self.payload_field) {
            Ok(tick) => tick,
            Err(e) => {
                self.stats.malformed += 1;
                record_entry("malformed");
                warn!(
                    category = "error",
                    kind = e.kind(),
                    entry_id = %e.entry_id(),
                    error = %e,
                    "Skipping malformed entry"
                );
                return Err(e);
            }
        };

        let observation = self.detector.observe(&tick);
        record_entry(observation.outcome().as_str());

        match &observation {
            Observation::Spike(alert) => {
                self.stats.spikes += 1;
                warn!(
                    category = "spike",
                    symbol = %alert.symbol,
                    change_pct = %format!("{:.2}", alert.change_pct()),
                    old_price = %format!("{:.2}", alert.old_price),
                    new_price = %format!("{:.2}", alert.new_price),
                    "Price spike detected"
                );
            }
            Observation::Stable { symbol, price, change } => {
                self.stats.stable += 1;
                debug!(
                    category = "stable",
                    symbol = %symbol,
                    price = %format!("{price:.2}"),
                    change_pct = %format!("{:.2}", change * 100.0),
                    "Price stable"
                );
            }
            Observation::First { symbol, price } => {
                self.stats.first += 1;
                debug!(
                    category = "first",
                    symbol = %symbol,
                    price = %format!("{price:.2}"),
                    "First price for symbol"
                );
            }
        }

        Ok(observation)
    }

    /// Wait for one batch and classify it.
    ///
    /// Returns the observations for the well-formed entries; malformed ones
    /// are logged, counted and left out.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the read fails.
    pub async fn poll_once(&mut self) -> Result<Vec<Observation>, StreamError> {
        let batch = self.tail.poll().await?;
        Ok(batch
            .iter()
            .filter_map(|entry| self.process_entry(entry).ok())
            .collect())
    }

    /// Consume the stream until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> AnalyzerStats {
        info!(
            cursor = %self.tail.cursor(),
            threshold = self.detector.threshold(),
            field = %self.payload_field,
            "Analyzer started"
        );

        while !cancel.is_cancelled() {
            let polled = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                polled = self.poll_once() => polled,
            };

            let Err(e) = polled else { continue };

            // The connection is usually torn down by the shutdown itself.
            if cancel.is_cancelled() {
                break;
            }

            self.stats.read_errors += 1;
            record_read_error();
            warn!(
                category = "error",
                error = %e,
                backoff_ms = self.error_backoff.as_millis(),
                "Stream read failed, retrying"
            );

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.error_backoff) => {}
            }
        }

        info!(
            entries = self.stats.entries,
            spikes = self.stats.spikes,
            malformed = self.stats.malformed,
            read_errors = self.stats.read_errors,
            "Analyzer stopped"
        );
        self.stats
    }
}
