//! Redis Streams Adapter
//!
//! Implements [`EventStream`] on top of a Redis stream:
//!
//! | Operation | Command |
//! |---|---|
//! | `append` | `XADD <key> * <field> <value> ...` |
//! | `read` | `XREAD COUNT <n> BLOCK <ms> STREAMS <key> <cursor>` |
//! | `last_entry_id` | `XREVRANGE <key> + - COUNT 1` |
//!
//! The connection is a [`ConnectionManager`], which reconnects on its own
//! after the initial connection succeeds. Establishing that initial
//! connection is retried with [`BackoffPolicy`]; running out of attempts is
//! fatal for the caller.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamId, StreamRangeReply, StreamReadReply};
use tokio_util::sync::CancellationToken;

use super::backoff::{BackoffConfig, BackoffPolicy};
use super::config::StreamSettings;
use super::metrics::record_connect_attempt;
use crate::application::ports::{EventStream, StreamError};
use crate::domain::entry::{Cursor, EntryId, FieldValue, StreamEntry};

/// Errors raised while establishing the Redis connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The connection URL could not be parsed.
    #[error("invalid redis url: {0}")]
    InvalidUrl(#[source] redis::RedisError),

    /// Every allowed attempt failed.
    #[error("could not connect to redis after {attempts} attempts: {last_error}")]
    MaxAttemptsExceeded {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// Shutdown was requested while connecting.
    #[error("connection cancelled by shutdown")]
    Cancelled,
}

/// Redis-backed stream.
#[derive(Clone)]
pub struct RedisStream {
    conn: ConnectionManager,
    key: String,
}

impl std::fmt::Debug for RedisStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStream")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RedisStream {
    /// Connect to Redis, retrying with backoff until connected, out of
    /// attempts, or cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if the URL is invalid, the attempt budget is
    /// exhausted, or `cancel` fires first.
    pub async fn connect(
        settings: &StreamSettings,
        cancel: &CancellationToken,
    ) -> Result<Self, ConnectError> {
        let client =
            redis::Client::open(settings.redis_url.as_str()).map_err(ConnectError::InvalidUrl)?;
        let mut policy =
            BackoffPolicy::new(BackoffConfig::from_connect_settings(&settings.connect));
        let mut attempts = 0_u32;

        loop {
            if cancel.is_cancelled() {
                return Err(ConnectError::Cancelled);
            }

            attempts += 1;
            record_connect_attempt();
            tracing::info!(
                url = %settings.redis_url,
                stream = %settings.stream_key,
                attempt = attempts,
                "Connecting to Redis"
            );

            let opened = tokio::select! {
                () = cancel.cancelled() => return Err(ConnectError::Cancelled),
                opened = Self::open(client.clone()) => opened,
            };

            let error = match opened {
                Ok(conn) => {
                    tracing::info!(stream = %settings.stream_key, "Redis connection established");
                    return Ok(Self {
                        conn,
                        key: settings.stream_key.clone(),
                    });
                }
                Err(e) => e,
            };

            let Some(delay) = policy.next_delay() else {
                return Err(ConnectError::MaxAttemptsExceeded {
                    attempts,
                    last_error: error.to_string(),
                });
            };

            tracing::warn!(
                error = %error,
                attempt = attempts,
                delay_ms = delay.as_millis(),
                "Redis connection failed, retrying"
            );

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Redis connect cancelled during backoff");
                    return Err(ConnectError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn open(client: redis::Client) -> redis::RedisResult<ConnectionManager> {
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(conn)
    }
}

/// Convert a reply entry into the domain envelope.
fn to_entry(raw: StreamId) -> Result<StreamEntry, StreamError> {
    let id: EntryId = raw
        .id
        .parse()
        .map_err(|e: crate::ParseEntryIdError| StreamError::Protocol(e.to_string()))?;

    let mut fields = HashMap::with_capacity(raw.map.len());
    for (name, value) in raw.map {
        let bytes: Vec<u8> = redis::from_redis_value(&value).map_err(|e| {
            StreamError::Protocol(format!("field '{name}' of entry {id}: {e}"))
        })?;
        fields.insert(name, FieldValue::from_bytes(bytes));
    }

    Ok(StreamEntry::new(id, fields))
}

/// Flatten an `XREAD` reply into the entries of stream `key`.
///
/// A nil reply means the block timed out with nothing new.
fn entries_from_reply(
    key: &str,
    reply: Option<StreamReadReply>,
) -> Result<Vec<StreamEntry>, StreamError> {
    let Some(reply) = reply else {
        return Ok(Vec::new());
    };

    reply
        .keys
        .into_iter()
        .filter(|stream| stream.key == key)
        .flat_map(|stream| stream.ids)
        .map(to_entry)
        .collect()
}

/// `BLOCK 0` means "forever" to Redis, so never send it.
fn block_millis(max_wait: Duration) -> u64 {
    u64::try_from(max_wait.as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}

#[async_trait]
impl EventStream for RedisStream {
    async fn append(&self, fields: &[(&str, &str)]) -> Result<EntryId, StreamError> {
        if fields.is_empty() {
            return Err(StreamError::EmptyRecord);
        }

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.key).arg("*");
        for (name, value) in fields {
            cmd.arg(*name).arg(*value);
        }

        let mut conn = self.conn.clone();
        let id: String = cmd.query_async(&mut conn).await?;
        id.parse()
            .map_err(|e: crate::ParseEntryIdError| StreamError::Protocol(e.to_string()))
    }

    async fn read(
        &self,
        cursor: &Cursor,
        max_wait: Duration,
        max_count: usize,
    ) -> Result<Vec<StreamEntry>, StreamError> {
        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = redis::cmd("XREAD")
            .arg("COUNT")
            .arg(max_count.max(1))
            .arg("BLOCK")
            .arg(block_millis(max_wait))
            .arg("STREAMS")
            .arg(&self.key)
            .arg(cursor.to_string())
            .query_async(&mut conn)
            .await?;

        entries_from_reply(&self.key, reply)
    }

    async fn last_entry_id(&self) -> Result<Option<EntryId>, StreamError> {
        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = redis::cmd("XREVRANGE")
            .arg(&self.key)
            .arg("+")
            .arg("-")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await?;

        reply
            .ids
            .first()
            .map(|newest| {
                newest
                    .id
                    .parse()
                    .map_err(|e: crate::ParseEntryIdError| StreamError::Protocol(e.to_string()))
            })
            .transpose()
    }
}
