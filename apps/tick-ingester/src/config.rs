//! Ingester Configuration
//!
//! Loaded from environment variables on top of the shared
//! [`StreamSettings`].

use std::ops::Range;
use std::time::Duration;

use price_stream::infrastructure::config::{
    parse_env_duration_millis, parse_env_f64, parse_env_list, parse_env_u16,
};
use price_stream::{ConfigError, StreamSettings};

use crate::generator::{DEFAULT_PRICE_RANGE, DEFAULT_SYMBOLS};

/// Complete ingester configuration.
#[derive(Debug, Clone)]
pub struct IngesterConfig {
    /// Shared stream settings.
    pub stream: StreamSettings,
    /// Time between ticks.
    pub interval: Duration,
    /// Symbol universe.
    pub symbols: Vec<String>,
    /// Inclusive lower price bound.
    pub price_min: f64,
    /// Exclusive upper price bound.
    pub price_max: f64,
    /// Prometheus exporter port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            stream: StreamSettings::default(),
            interval: Duration::from_secs(1),
            symbols: DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect(),
            price_min: DEFAULT_PRICE_RANGE.start,
            price_max: DEFAULT_PRICE_RANGE.end,
            metrics_port: 0,
        }
    }
}

impl IngesterConfig {
    /// Create configuration from environment variables.
    ///
    /// - `INGESTER_INTERVAL_MS` (default 1000)
    /// - `INGESTER_SYMBOLS` (default `AAPL,TSLA,NVDA,MSFT,GOOGL`)
    /// - `INGESTER_PRICE_MIN` / `INGESTER_PRICE_MAX` (default 100 / 600)
    /// - `METRICS_PORT` (default 0, disabled)
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            stream: StreamSettings::from_env()?,
            interval: parse_env_duration_millis("INGESTER_INTERVAL_MS", defaults.interval),
            symbols: parse_env_list("INGESTER_SYMBOLS", &DEFAULT_SYMBOLS),
            price_min: parse_env_f64("INGESTER_PRICE_MIN", defaults.price_min),
            price_max: parse_env_f64("INGESTER_PRICE_MAX", defaults.price_max),
            metrics_port: parse_env_u16("METRICS_PORT", defaults.metrics_port),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::invalid(
                "INGESTER_INTERVAL_MS",
                "must be greater than zero",
            ));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::invalid(
                "INGESTER_SYMBOLS",
                "at least one symbol is required",
            ));
        }
        if !(self.price_min.is_finite() && self.price_min > 0.0) {
            return Err(ConfigError::invalid(
                "INGESTER_PRICE_MIN",
                "must be a positive number",
            ));
        }
        if !(self.price_max.is_finite() && self.price_max > self.price_min) {
            return Err(ConfigError::invalid(
                "INGESTER_PRICE_MAX",
                "must be greater than INGESTER_PRICE_MIN",
            ));
        }
        Ok(())
    }

    /// Price range as `[min, max)`.
    #[must_use]
    pub const fn price_range(&self) -> Range<f64> {
        self.price_min..self.price_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_feed() {
        let config = IngesterConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.symbols, vec!["AAPL", "TSLA", "NVDA", "MSFT", "GOOGL"]);
        assert_eq!(config.price_range(), 100.0..600.0);
        assert_eq!(config.metrics_port, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = IngesterConfig {
            interval: Duration::ZERO,
            ..IngesterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_universe() {
        let config = IngesterConfig {
            symbols: vec![],
            ..IngesterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let config = IngesterConfig {
            price_min: 500.0,
            price_max: 100.0,
            ..IngesterConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("INGESTER_PRICE_MAX"));
    }

    #[test]
    fn validate_rejects_non_positive_min() {
        let config = IngesterConfig {
            price_min: 0.0,
            ..IngesterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
