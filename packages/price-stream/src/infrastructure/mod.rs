//! Infrastructure Layer - Adapters and process plumbing.
//!
//! Concrete implementations of the stream port plus the ambient pieces
//! both binaries share: configuration, telemetry, metrics and shutdown.

/// Exponential backoff for connection establishment.
pub mod backoff;

/// Environment-driven configuration.
pub mod config;

/// In-process stream adapter.
pub mod memory;

/// Prometheus metrics exporter.
pub mod metrics;

/// Redis streams adapter.
pub mod redis_stream;

/// Signal handling for graceful shutdown.
pub mod shutdown;

/// Tracing subscriber and optional OpenTelemetry export.
pub mod telemetry;
