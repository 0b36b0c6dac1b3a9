//! Publish Loop
//!
//! Once per interval the ingester draws a tick, encodes it and appends it
//! to the stream as a single-field record. A failed publish is logged and
//! counted; the loop keeps going on the next interval.

use std::time::Duration;

use price_stream::{EntryId, EventStream, PriceTick, StreamError, TickError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::generator::TickGenerator;
use crate::metrics::{record_publish_error, record_published};

/// Errors from a single publish attempt.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The generated tick could not be built or encoded.
    #[error("invalid tick: {0}")]
    InvalidTick(#[from] TickError),

    /// The stream rejected the append.
    #[error("append failed: {0}")]
    Stream(#[from] StreamError),
}

impl PublishError {
    /// Short label used as a metric dimension.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidTick(_) => "invalid_tick",
            Self::Stream(_) => "stream",
        }
    }
}

/// A tick that made it onto the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    /// Id the stream assigned.
    pub entry_id: EntryId,
    /// The tick as encoded.
    pub tick: PriceTick,
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngesterStats {
    /// Successful appends.
    pub published: u64,
    /// Failed attempts.
    pub failed: u64,
}

/// Periodic tick producer.
pub struct Ingester<S> {
    stream: S,
    generator: TickGenerator,
    payload_field: String,
    interval: Duration,
    stats: IngesterStats,
}

impl<S: EventStream> Ingester<S> {
    /// Create an ingester that writes the encoded tick under `payload_field`.
    pub fn new(
        stream: S,
        generator: TickGenerator,
        payload_field: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            stream,
            generator,
            payload_field: payload_field.into(),
            interval,
            stats: IngesterStats::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> IngesterStats {
        self.stats
    }

    /// Generate and publish exactly one tick.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if encoding or the append fails. Nothing is
    /// retried here; the next interval simply tries a fresh tick.
    pub async fn tick(&mut self) -> Result<Published, PublishError> {
        match self.publish_one().await {
            Ok(published) => {
                self.stats.published += 1;
                record_published(published.tick.symbol());
                info!(
                    symbol = %published.tick.symbol(),
                    price = %format!("{:.2}", published.tick.price()),
                    entry_id = %published.entry_id,
                    "Published price"
                );
                Ok(published)
            }
            Err(e) => {
                self.stats.failed += 1;
                record_publish_error(e.reason());
                error!(category = "error", error = %e, "Failed to publish price");
                Err(e)
            }
        }
    }

    async fn publish_one(&mut self) -> Result<Published, PublishError> {
        let tick = self.generator.next_tick()?;
        let payload = tick.encode()?;
        let entry_id = self
            .stream
            .append(&[(self.payload_field.as_str(), payload.as_str())])
            .await?;
        Ok(Published { entry_id, tick })
    }

    /// Publish on every interval until `cancel` fires.
    ///
    /// The first tick goes out immediately. If a publish overruns the
    /// interval the missed ticks are skipped rather than bunched up.
    pub async fn run(mut self, cancel: CancellationToken) -> IngesterStats {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = self.interval.as_millis(),
            symbols = ?self.generator.symbols(),
            price_min = self.generator.prices().start,
            price_max = self.generator.prices().end,
            "Ingester started"
        );

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        // Errors are already logged and counted.
                        _ = self.tick() => {}
                    }
                }
            }
        }

        info!(
            published = self.stats.published,
            failed = self.stats.failed,
            "Ingester stopped"
        );
        self.stats
    }
}
