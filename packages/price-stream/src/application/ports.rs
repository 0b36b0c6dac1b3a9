//! Port Interfaces
//!
//! Defines the stream contract following the Hexagonal Architecture
//! pattern. Any ordered, append-only log that can satisfy these three
//! operations can back the pipeline.
//!
//! ## Driven Ports (Outbound)
//!
//! - `EventStream`: Append records and tail them from a cursor

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entry::{Cursor, EntryId, StreamEntry};

/// Errors surfaced by stream transports.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Redis command or connection failure.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The transport answered with something the adapter cannot interpret.
    #[error("malformed stream reply: {0}")]
    Protocol(String),

    /// A record with no fields cannot be appended.
    #[error("cannot append an empty record")]
    EmptyRecord,

    /// The transport is not connected.
    #[error("stream disconnected")]
    Disconnected,
}

/// An ordered, durable, append-only log of multi-field records.
///
/// Implementations must be safe to share between concurrent readers and
/// writers; callers never lock around them.
#[async_trait]
pub trait EventStream: Send + Sync {
    /// Atomically append one record and return the id the stream assigned.
    async fn append(&self, fields: &[(&str, &str)]) -> Result<EntryId, StreamError>;

    /// Read up to `max_count` entries strictly after `cursor`, in arrival
    /// order.
    ///
    /// Blocks for at most `max_wait` when nothing is available and returns
    /// an empty batch on timeout.
    async fn read(
        &self,
        cursor: &Cursor,
        max_wait: Duration,
        max_count: usize,
    ) -> Result<Vec<StreamEntry>, StreamError>;

    /// Id of the newest entry, or `None` for an empty stream.
    async fn last_entry_id(&self) -> Result<Option<EntryId>, StreamError>;
}
