//! Tick Ingester Binary
//!
//! Publishes one synthetic price tick per interval to the Redis stream.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tick-ingester
//! ```
//!
//! # Environment Variables
//!
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `PRICE_STREAM_KEY`: Stream key (default: stock-stream)
//! - `PRICE_STREAM_FIELD`: Payload field name (default: event)
//! - `INGESTER_INTERVAL_MS`: Time between ticks (default: 1000)
//! - `INGESTER_SYMBOLS`: Comma-separated symbol universe
//! - `INGESTER_PRICE_MIN` / `INGESTER_PRICE_MAX`: Price range (default: 100 / 600)
//! - `METRICS_PORT`: Prometheus metrics port (default: 0, disabled)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log level (default: info)

use price_stream::{
    ConnectError, MetricsConfig, RedisStream, await_shutdown, init_metrics, init_telemetry,
    load_dotenv,
};
use tick_ingester::{Ingester, IngesterConfig, TickGenerator};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = init_telemetry("tick-ingester");

    tracing::info!("Starting Tick Ingester");

    let config = IngesterConfig::from_env()?;
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

    let generator = TickGenerator::new(config.symbols.clone(), config.price_range())?;
    let ingester = Ingester::new(
        stream,
        generator,
        config.stream.payload_field.clone(),
        config.interval,
    );

    let stats = ingester.run(shutdown_token).await;

    tracing::info!(
        published = stats.published,
        failed = stats.failed,
        "Tick Ingester stopped"
    );
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &IngesterConfig) {
    tracing::info!(
        stream = %config.stream.stream_key,
        field = %config.stream.payload_field,
        interval_ms = config.interval.as_millis(),
        price_min = config.price_min,
        price_max = config.price_max,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
    tracing::debug!(symbols = ?config.symbols, "Symbol universe");
}
