//! In-Memory Stream
//!
//! A process-local [`EventStream`] with the same ordering and cursor
//! semantics as the Redis adapter. Clones share one log, so an ingester
//! and an analyzer can be wired together in a single process (tests,
//! demos, embedding).
//!
//! The stream can be switched to a disconnected state to exercise the
//! transient-error paths of its callers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::application::ports::{EventStream, StreamError};
use crate::domain::entry::{Cursor, EntryId, FieldValue, StreamEntry};

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<Vec<StreamEntry>>,
    appended: Notify,
    disconnected: AtomicBool,
}

/// Shared in-process append-only log.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    shared: Arc<Shared>,
}

impl MemoryStream {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.entries.lock().is_empty()
    }

    /// Snapshot of every entry in arrival order.
    #[must_use]
    pub fn entries(&self) -> Vec<StreamEntry> {
        self.shared.entries.lock().clone()
    }

    /// Make every operation fail with [`StreamError::Disconnected`] until
    /// [`MemoryStream::reconnect`] is called.
    pub fn disconnect(&self) {
        self.shared.disconnected.store(true, Ordering::SeqCst);
        // Wake blocked readers so they observe the failure.
        self.shared.appended.notify_waiters();
    }

    /// Undo [`MemoryStream::disconnect`].
    pub fn reconnect(&self) {
        self.shared.disconnected.store(false, Ordering::SeqCst);
    }

    fn ensure_connected(&self) -> Result<(), StreamError> {
        if self.shared.disconnected.load(Ordering::SeqCst) {
            Err(StreamError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn next_id(last: Option<EntryId>) -> EntryId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        match last {
            Some(last) if now <= last.millis() => EntryId::new(last.millis(), last.seq() + 1),
            _ => EntryId::new(now, 0),
        }
    }

    fn tail_id(&self) -> Option<EntryId> {
        self.shared.entries.lock().last().map(StreamEntry::id)
    }

    fn entries_after(&self, after: Option<EntryId>, max_count: usize) -> Vec<StreamEntry> {
        let entries = self.shared.entries.lock();
        let start = after.map_or(0, |id| entries.partition_point(|e| e.id() <= id));
        entries[start..].iter().take(max_count).cloned().collect()
    }
}

#[async_trait]
impl EventStream for MemoryStream {
    async fn append(&self, fields: &[(&str, &str)]) -> Result<EntryId, StreamError> {
        self.ensure_connected()?;
        if fields.is_empty() {
            return Err(StreamError::EmptyRecord);
        }

        let values: HashMap<String, FieldValue> = fields
            .iter()
            .map(|(name, value)| ((*name).to_string(), FieldValue::from(*value)))
            .collect();

        let id = {
            let mut entries = self.shared.entries.lock();
            let id = Self::next_id(entries.last().map(StreamEntry::id));
            entries.push(StreamEntry::new(id, values));
            id
        };

        self.shared.appended.notify_waiters();
        Ok(id)
    }

    async fn read(
        &self,
        cursor: &Cursor,
        max_wait: Duration,
        max_count: usize,
    ) -> Result<Vec<StreamEntry>, StreamError> {
        self.ensure_connected()?;

        let deadline = Instant::now() + max_wait;
        let max_count = max_count.max(1);
        // `Latest` pins to whatever the tail is when the read starts.
        let after = match cursor {
            Cursor::Latest => self.tail_id(),
            Cursor::After(id) => Some(*id),
        };

        loop {
            // Register interest before checking so an append between the
            // check and the wait is not missed.
            let appended = self.shared.appended.notified();

            self.ensure_connected()?;
            let batch = self.entries_after(after, max_count);
            if !batch.is_empty() {
                return Ok(batch);
            }

            if tokio::time::timeout_at(deadline, appended).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn last_entry_id(&self) -> Result<Option<EntryId>, StreamError> {
        self.ensure_connected()?;
        Ok(self.tail_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let stream = MemoryStream::new();
        let mut previous = EntryId::MIN;
        for i in 0..50 {
            let value = i.to_string();
            let id = stream.append(&[("event", value.as_str())]).await.unwrap();
            assert!(id > previous);
            previous = id;
        }
        assert_eq!(stream.len(), 50);
        assert_eq!(stream.last_entry_id().await.unwrap(), Some(previous));
    }

    #[tokio::test]
    async fn append_rejects_empty_record() {
        let stream = MemoryStream::new();
        assert!(matches!(
            stream.append(&[]).await,
            Err(StreamError::EmptyRecord)
        ));
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn read_after_cursor_returns_newer_entries_in_order() {
        let stream = MemoryStream::new();
        let first = stream.append(&[("event", "a")]).await.unwrap();
        stream.append(&[("event", "b")]).await.unwrap();
        stream.append(&[("event", "c")]).await.unwrap();

        let batch = stream.read(&Cursor::After(first), WAIT, 10).await.unwrap();
        let payloads: Vec<_> = batch
            .iter()
            .map(|e| e.payload("event").unwrap().to_string())
            .collect();
        assert_eq!(payloads, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn read_respects_max_count() {
        let stream = MemoryStream::new();
        for value in ["a", "b", "c"] {
            stream.append(&[("event", value)]).await.unwrap();
        }

        let batch = stream
            .read(&Cursor::After(EntryId::MIN), WAIT, 2)
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn read_times_out_with_empty_batch() {
        let stream = MemoryStream::new();
        let started = std::time::Instant::now();
        let batch = stream.read(&Cursor::Latest, WAIT, 10).await.unwrap();
        assert!(batch.is_empty());
        assert!(started.elapsed() >= WAIT);
    }

    #[tokio::test]
    async fn latest_cursor_skips_existing_entries() {
        let stream = MemoryStream::new();
        stream.append(&[("event", "old")]).await.unwrap();

        let reader = stream.clone();
        let handle = tokio::spawn(async move {
            reader
                .read(&Cursor::Latest, Duration::from_secs(2), 10)
                .await
                .unwrap()
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.append(&[("event", "new")]).await.unwrap();

        let batch = handle.await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload("event").unwrap(), "new");
    }

    #[tokio::test]
    async fn blocked_read_wakes_on_append() {
        let stream = MemoryStream::new();
        let reader = stream.clone();
        let handle = tokio::spawn(async move {
            reader
                .read(&Cursor::After(EntryId::MIN), Duration::from_secs(5), 10)
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.append(&[("event", "x")]).await.unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("read should wake before its deadline")
            .unwrap()
            .unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn disconnected_stream_fails_operations() {
        let stream = MemoryStream::new();
        stream.disconnect();

        assert!(matches!(
            stream.append(&[("event", "x")]).await,
            Err(StreamError::Disconnected)
        ));
        assert!(matches!(
            stream.read(&Cursor::Latest, WAIT, 1).await,
            Err(StreamError::Disconnected)
        ));

        stream.reconnect();
        assert!(stream.append(&[("event", "x")]).await.is_ok());
    }

    #[tokio::test]
    async fn disconnect_interrupts_blocked_reader() {
        let stream = MemoryStream::new();
        let reader = stream.clone();
        let handle = tokio::spawn(async move {
            reader
                .read(&Cursor::Latest, Duration::from_secs(5), 10)
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.disconnect();

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(StreamError::Disconnected)));
    }

    #[test]
    fn next_id_bumps_sequence_within_same_millisecond() {
        let future = EntryId::new(u64::MAX / 2, 4);
        assert_eq!(
            MemoryStream::next_id(Some(future)),
            EntryId::new(u64::MAX / 2, 5)
        );
    }
}
