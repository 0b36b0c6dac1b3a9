#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines
    )
)]

//! Price Stream - Shared Pipeline Plumbing
//!
//! The log-based backbone shared by the tick ingester and the spike
//! analyzer: the price tick wire format, the append-only stream port, and
//! the adapters that implement it.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Wire format and stream entry types
//!   - `tick`: `PriceTick` and its JSON encoding
//!   - `entry`: Entry ids, cursors and payload extraction
//!
//! - **Application**: Port definitions
//!   - `ports`: The `EventStream` contract every transport implements
//!
//! - **Infrastructure**: Adapters and process plumbing
//!   - `redis_stream`: Redis streams adapter (`XADD`/`XREAD`)
//!   - `memory`: In-process stream used by tests and embedders
//!   - `backoff`: Connection retry policy
//!   - `config`: Environment-driven settings
//!   - `metrics`, `telemetry`, `shutdown`: Observability and lifecycle
//!
//! # Data Flow
//!
//! ```text
//! tick-ingester ──XADD──► stream "stock-stream" ──XREAD BLOCK──► spike-analyzer
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Wire format and stream entry types.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters and process plumbing.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::entry::{
    Cursor, EntryError, EntryId, FieldValue, ParseEntryIdError, StreamEntry,
};
pub use domain::tick::{PriceTick, TickError};

// Ports
pub use application::ports::{EventStream, StreamError};

// Adapters
pub use infrastructure::backoff::{BackoffConfig, BackoffPolicy};
pub use infrastructure::memory::MemoryStream;
pub use infrastructure::redis_stream::{ConnectError, RedisStream};

// Configuration
pub use infrastructure::config::{ConfigError, ConnectSettings, StreamSettings, load_dotenv};

// Observability and lifecycle
pub use infrastructure::metrics::{MetricsConfig, MetricsError, init_metrics};
pub use infrastructure::shutdown::await_shutdown;
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
