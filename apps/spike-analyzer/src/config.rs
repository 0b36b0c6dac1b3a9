//! Analyzer Configuration

use std::time::Duration;

use price_stream::infrastructure::config::{
    parse_env_duration_millis, parse_env_f64, parse_env_u16, parse_env_usize,
};
use price_stream::{ConfigError, StreamSettings};

use crate::detector::DEFAULT_SPIKE_THRESHOLD;

/// Complete analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Shared stream settings.
    pub stream: StreamSettings,
    /// Longest a single read blocks waiting for entries.
    pub block: Duration,
    /// Most entries returned by a single read.
    pub batch_size: usize,
    /// Absolute relative change above which a tick is a spike.
    pub spike_threshold: f64,
    /// Pause after a failed read.
    pub error_backoff: Duration,
    /// Prometheus exporter port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            stream: StreamSettings::default(),
            block: Duration::from_secs(2),
            batch_size: 10,
            spike_threshold: DEFAULT_SPIKE_THRESHOLD,
            error_backoff: Duration::from_millis(500),
            metrics_port: 0,
        }
    }
}

impl AnalyzerConfig {
    /// Create configuration from environment variables.
    ///
    /// - `ANALYZER_BLOCK_MS` (default 2000)
    /// - `ANALYZER_BATCH_SIZE` (default 10)
    /// - `ANALYZER_SPIKE_THRESHOLD` (default 0.05)
    /// - `ANALYZER_ERROR_BACKOFF_MS` (default 500)
    /// - `METRICS_PORT` (default 0, disabled)
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            stream: StreamSettings::from_env()?,
            block: parse_env_duration_millis("ANALYZER_BLOCK_MS", defaults.block),
            batch_size: parse_env_usize("ANALYZER_BATCH_SIZE", defaults.batch_size),
            spike_threshold: parse_env_f64("ANALYZER_SPIKE_THRESHOLD", defaults.spike_threshold),
            error_backoff: parse_env_duration_millis(
                "ANALYZER_ERROR_BACKOFF_MS",
                defaults.error_backoff,
            ),
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
        // Redis treats BLOCK 0 as "wait forever".
        if self.block.is_zero() {
            return Err(ConfigError::invalid(
                "ANALYZER_BLOCK_MS",
                "must be greater than zero",
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid(
                "ANALYZER_BATCH_SIZE",
                "must be at least 1",
            ));
        }
        if !(self.spike_threshold.is_finite() && self.spike_threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "ANALYZER_SPIKE_THRESHOLD",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.block, Duration::from_secs(2));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.spike_threshold, 0.05);
        assert_eq!(config.error_backoff, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_block_is_rejected() {
        let config = AnalyzerConfig {
            block: Duration::ZERO,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_batch_is_rejected() {
        let config = AnalyzerConfig {
            batch_size: 0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_thresholds_are_rejected() {
        for threshold in [-0.01, f64::NAN, f64::INFINITY] {
            let config = AnalyzerConfig {
                spike_threshold: threshold,
                ..AnalyzerConfig::default()
            };
            assert!(config.validate().is_err(), "{threshold} should be rejected");
        }
    }
}
