//! Stream Entries
//!
//! The envelope a stream hands back on read: a stream-assigned [`EntryId`]
//! plus a flat map of named fields. One field carries the encoded
//! [`PriceTick`]; everything else is ignored by the pipeline.
//!
//! Payload extraction is a two-stage contract so diagnostics can tell the
//! failure kinds apart:
//!
//! 1. [`StreamEntry::payload`] checks the field is present and is text.
//! 2. [`StreamEntry::decode_tick`] runs the structured decode on top.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::tick::{PriceTick, TickError};

// =============================================================================
// Entry Id
// =============================================================================

/// Position of an entry in the stream, formatted `<millis>-<seq>`.
///
/// Ids are assigned by the stream, strictly increasing in append order and
/// totally ordered by `(millis, seq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    millis: u64,
    seq: u64,
}

impl EntryId {
    /// The smallest id; every real entry sorts after it.
    pub const MIN: Self = Self { millis: 0, seq: 0 };

    /// Create an id from its parts.
    #[must_use]
    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    /// Millisecond component.
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.millis
    }

    /// Sequence number within the millisecond.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

/// Error returned when an entry id string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry id: {0:?}")]
pub struct ParseEntryIdError(String);

impl FromStr for EntryId {
    type Err = ParseEntryIdError;

    /// Parse `<millis>-<seq>`; a bare `<millis>` means sequence 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEntryIdError(s.to_string());
        let (millis, seq) = s.split_once('-').unwrap_or((s, "0"));
        let millis = millis.parse().map_err(|_| invalid())?;
        let seq = seq.parse().map_err(|_| invalid())?;
        Ok(Self { millis, seq })
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Read position of a consumer.
///
/// A cursor only ever moves forward: [`Cursor::advance`] ignores ids at or
/// before the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Only entries appended after the read starts (`$` in Redis terms).
    #[default]
    Latest,
    /// Entries strictly after the given id.
    After(EntryId),
}

impl Cursor {
    /// Move the cursor past `id`.
    pub fn advance(&mut self, id: EntryId) {
        match self {
            Self::After(current) if *current >= id => {}
            _ => *self = Self::After(id),
        }
    }

    /// The id this cursor sits after, if it has been resolved.
    #[must_use]
    pub const fn position(&self) -> Option<EntryId> {
        match self {
            Self::Latest => None,
            Self::After(id) => Some(*id),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("$"),
            Self::After(id) => write!(f, "{id}"),
        }
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// Value of a single entry field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    Binary(Vec<u8>),
}

impl FieldValue {
    /// Classify raw bytes as text or binary.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        String::from_utf8(bytes).map_or_else(|e| Self::Binary(e.into_bytes()), Self::Text)
    }

    /// Borrow the value as text, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// Stream Entry
// =============================================================================

/// Errors raised while turning an entry into a [`PriceTick`].
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// The payload field is absent.
    #[error("entry {entry_id} has no '{field}' field")]
    MissingField {
        /// Offending entry.
        entry_id: EntryId,
        /// Expected field name.
        field: String,
    },

    /// The payload field is present but is not text.
    #[error("entry {entry_id} field '{field}' is not UTF-8 text")]
    FieldType {
        /// Offending entry.
        entry_id: EntryId,
        /// Field name.
        field: String,
    },

    /// The payload text is not a valid tick.
    #[error("entry {entry_id} payload could not be decoded: {source}")]
    Decode {
        /// Offending entry.
        entry_id: EntryId,
        /// Underlying decode failure.
        #[source]
        source: TickError,
    },
}

impl EntryError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::FieldType { .. } => "field_type",
            Self::Decode { .. } => "decode",
        }
    }

    /// Id of the entry that failed.
    #[must_use]
    pub const fn entry_id(&self) -> EntryId {
        match self {
            Self::MissingField { entry_id, .. }
            | Self::FieldType { entry_id, .. }
            | Self::Decode { entry_id, .. } => *entry_id,
        }
    }
}

/// One immutable record read back from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    id: EntryId,
    fields: HashMap<String, FieldValue>,
}

impl StreamEntry {
    /// Create an entry.
    #[must_use]
    pub const fn new(id: EntryId, fields: HashMap<String, FieldValue>) -> Self {
        Self { id, fields }
    }

    /// Stream-assigned id.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// Look up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All fields.
    #[must_use]
    pub const fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// Extract the payload text from `field`.
    ///
    /// # Errors
    ///
    /// [`EntryError::MissingField`] if absent, [`EntryError::FieldType`] if
    /// the value is not text.
    pub fn payload(&self, field: &str) -> Result<&str, EntryError> {
        let value = self.field(field).ok_or_else(|| EntryError::MissingField {
            entry_id: self.id,
            field: field.to_string(),
        })?;

        value.as_text().ok_or_else(|| EntryError::FieldType {
            entry_id: self.id,
            field: field.to_string(),
        })
    }

    /// Extract and decode the tick carried in `field`.
    ///
    /// # Errors
    ///
    /// Any [`EntryError`] variant.
    pub fn decode_tick(&self, field: &str) -> Result<PriceTick, EntryError> {
        let payload = self.payload(field)?;
        PriceTick::decode(payload).map_err(|source| EntryError::Decode {
            entry_id: self.id,
            source,
        })
    }
}
