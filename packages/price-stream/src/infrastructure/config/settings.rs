//! Stream Configuration Settings
//!
//! Connection settings for the shared stream, loaded from environment
//! variables. Unparseable numeric values fall back to their defaults;
//! values that parse but make no sense are rejected with [`ConfigError`].

use std::time::Duration;

/// Default Redis endpoint.
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Default stream key.
const DEFAULT_STREAM_KEY: &str = "stock-stream";

/// Default name of the field carrying the encoded tick.
const DEFAULT_PAYLOAD_FIELD: &str = "event";

/// Startup connection retry settings.
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    /// Delay before the second connection attempt.
    pub delay_initial: Duration,
    /// Maximum delay between attempts.
    pub delay_max: Duration,
    /// Delay multiplier for exponential backoff.
    pub delay_multiplier: f64,
    /// Attempts before startup fails (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            delay_initial: Duration::from_millis(500),
            delay_max: Duration::from_secs(10),
            delay_multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

/// Where the pipeline's stream lives and how records are shaped.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Redis connection URL.
    pub redis_url: String,
    /// Stream key both processes share.
    pub stream_key: String,
    /// Entry field carrying the encoded tick.
    pub payload_field: String,
    /// Startup connection retries.
    pub connect: ConnectSettings,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            stream_key: DEFAULT_STREAM_KEY.to_string(),
            payload_field: DEFAULT_PAYLOAD_FIELD.to_string(),
            connect: ConnectSettings::default(),
        }
    }
}

impl StreamSettings {
    /// Create settings from environment variables.
    ///
    /// - `REDIS_URL` (default `redis://localhost:6379`)
    /// - `PRICE_STREAM_KEY` (default `stock-stream`)
    /// - `PRICE_STREAM_FIELD` (default `event`)
    /// - `PRICE_STREAM_CONNECT_DELAY_INITIAL_MS` (default 500)
    /// - `PRICE_STREAM_CONNECT_DELAY_MAX_SECS` (default 10)
    /// - `PRICE_STREAM_CONNECT_DELAY_MULTIPLIER` (default 2.0)
    /// - `PRICE_STREAM_CONNECT_MAX_ATTEMPTS` (default 5)
    ///
    /// # Errors
    ///
    /// Returns an error if a string setting is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let redis_url = parse_env_string("REDIS_URL", &defaults.redis_url)?;
        let stream_key = parse_env_string("PRICE_STREAM_KEY", &defaults.stream_key)?;
        let payload_field = parse_env_string("PRICE_STREAM_FIELD", &defaults.payload_field)?;

        let connect = ConnectSettings {
            delay_initial: parse_env_duration_millis(
                "PRICE_STREAM_CONNECT_DELAY_INITIAL_MS",
                defaults.connect.delay_initial,
            ),
            delay_max: parse_env_duration_secs(
                "PRICE_STREAM_CONNECT_DELAY_MAX_SECS",
                defaults.connect.delay_max,
            ),
            delay_multiplier: parse_env_f64(
                "PRICE_STREAM_CONNECT_DELAY_MULTIPLIER",
                defaults.connect.delay_multiplier,
            ),
            max_attempts: parse_env_u32(
                "PRICE_STREAM_CONNECT_MAX_ATTEMPTS",
                defaults.connect.max_attempts,
            ),
        };

        let settings = Self {
            redis_url,
            stream_key,
            payload_field,
            connect,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connect.validate()
    }
}

impl ConnectSettings {
    /// Accepted range for the backoff multiplier.
    pub const MULTIPLIER_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

    /// Check that the retry schedule is usable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Self::MULTIPLIER_RANGE.contains(&self.delay_multiplier) {
            return Err(ConfigError::invalid(
                "PRICE_STREAM_CONNECT_DELAY_MULTIPLIER",
                format!(
                    "must be between {} and {}",
                    Self::MULTIPLIER_RANGE.start(),
                    Self::MULTIPLIER_RANGE.end()
                ),
            ));
        }
        if self.delay_initial.is_zero() {
            return Err(ConfigError::invalid(
                "PRICE_STREAM_CONNECT_DELAY_INITIAL_MS",
                "must be greater than zero",
            ));
        }
        if self.delay_initial > self.delay_max {
            return Err(ConfigError::invalid(
                "PRICE_STREAM_CONNECT_DELAY_MAX_SECS",
                "must not be shorter than the initial delay",
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable parsed but is out of range.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    #[must_use]
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

fn parse_env_string(key: &str, default: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => Ok(default.to_string()),
    }
}

/// Read a `u16`, falling back to `default` when unset or unparseable.
#[must_use]
pub fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a `u32`, falling back to `default` when unset or unparseable.
#[must_use]
pub fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a `usize`, falling back to `default` when unset or unparseable.
#[must_use]
pub fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read an `f64`, falling back to `default` when unset or unparseable.
#[must_use]
pub fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a whole number of seconds.
#[must_use]
pub fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

/// Read a whole number of milliseconds.
#[must_use]
pub fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

/// Read a comma-separated list, dropping blank items.
///
/// Falls back to `default` when the variable is unset.
#[must_use]
pub fn parse_env_list(key: &str, default: &[&str]) -> Vec<String> {
    std::env::var(key).map_or_else(
        |_| default.iter().map(ToString::to_string).collect(),
        |v| split_list(&v),
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Load `.env` from the current directory or the nearest ancestor that has
/// one. A missing file is not an error.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
