//! Domain Layer - Wire format and stream entry types.
//!
//! Pure types with no transport dependencies. Everything here is shared
//! verbatim between the producer and the consumer side of the pipeline.

/// Price tick record and its JSON encoding.
pub mod tick;

/// Stream entry envelope, entry ids and cursors.
pub mod entry;
