//! Spike Analyzer Binary
//!
//! Tails the Redis price stream and logs every price spike.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin spike-analyzer
//! ```
//!
//! # Environment Variables
//!
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `PRICE_STREAM_KEY`: Stream key (default: stock-stream)
//! - `PRICE_STREAM_FIELD`: Payload field name (default: event)
//! - `ANALYZER_BLOCK_MS`: Longest blocking read (default: 2000)
//! - `ANALYZER_BATCH_SIZE`: Entries per read (default: 10)
//! - `ANALYZER_SPIKE_THRESHOLD`: Relative change threshold (default: 0.05)
//! - `ANALYZER_ERROR_BACKOFF_MS`: Pause after a failed read (default: 500)
//! - `METRICS_PORT`: Prometheus metrics port (default: 0, disabled)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log level (default: info)

use price_stream::{
    ConnectError, MetricsConfig, RedisStream, await_shutdown, init_metrics, init_telemetry,
    load_dotenv,
};
use spike_analyzer::{Analyzer, AnalyzerConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = init_telemetry("spike-analyzer");

    tracing::info!("Starting Spike Analyzer");

    let config = AnalyzerConfig::from_env()?;
    log_config(&config);

    if config.metrics_port != 0 {
        init_metrics(&MetricsConfig::with_port(config.metrics_port))?;
    }

    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let stream = match RedisStream::connect(&config.stream, &shutdown_token).await {
        Ok(stream) => stream,
        Err(ConnectError::Cancelled) => {
            tracing::info!("Shutdown requested before connecting");
            return Ok(());
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not connect to Redis");
            return Err(e.into());
        }
    };

    let analyzer = Analyzer::start(stream, &config).await;
    let stats = analyzer.run(shutdown_token).await;

    tracing::info!(
        entries = stats.entries,
        spikes = stats.spikes,
        stable = stats.stable,
        first = stats.first,
        malformed = stats.malformed,
        read_errors = stats.read_errors,
        "Spike Analyzer stopped"
    );
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &AnalyzerConfig) {
    tracing::info!(
        stream = %config.stream.stream_key,
        field = %config.stream.payload_field,
        block_ms = config.block.as_millis(),
        batch_size = config.batch_size,
        spike_threshold = config.spike_threshold,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
}
