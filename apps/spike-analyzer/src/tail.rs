//! Stream Tail
//!
//! Reads a stream forward from the point of subscription. The cursor is
//! pinned to a concrete entry id at subscribe time, so entries appended
//! between two polls are never skipped, and it only ever advances.

use std::time::Duration;

use price_stream::{Cursor, EntryId, EventStream, StreamEntry, StreamError};
use tracing::{debug, warn};

/// Forward-only reader over an [`EventStream`].
#[derive(Debug)]
pub struct StreamTail<S> {
    stream: S,
    cursor: Cursor,
    block: Duration,
    batch_size: usize,
}

impl<S: EventStream> StreamTail<S> {
    /// Start tailing from the current end of `stream`.
    ///
    /// Existing entries are not replayed. If the tail id cannot be looked
    /// up the cursor stays at [`Cursor::Latest`] and resolves on the first
    /// entry received.
    pub async fn subscribe(stream: S, block: Duration, batch_size: usize) -> Self {
        let cursor = match stream.last_entry_id().await {
            Ok(Some(id)) => Cursor::After(id),
            Ok(None) => Cursor::After(EntryId::MIN),
            Err(e) => {
                warn!(
                    category = "error",
                    error = %e,
                    "Could not resolve stream tail, reading from latest"
                );
                Cursor::Latest
            }
        };
        debug!(cursor = %cursor, "Subscribed to stream");

        Self {
            stream,
            cursor,
            block,
            batch_size: batch_size.max(1),
        }
    }

    /// Wait up to the block duration for new entries.
    ///
    /// Returns them in arrival order and moves the cursor past the last
    /// one. An empty batch means the wait timed out.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the cursor is left where it was.
    pub async fn poll(&mut self) -> Result<Vec<StreamEntry>, StreamError> {
        let batch = self
            .stream
            .read(&self.cursor, self.block, self.batch_size)
            .await?;

        if let Some(last) = batch.last() {
            self.cursor.advance(last.id());
        }
        Ok(batch)
    }

    /// Current read position.
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }
}
