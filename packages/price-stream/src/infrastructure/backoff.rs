//! Connection Backoff
//!
//! Exponential backoff with jitter for establishing the stream connection.
//! Startup is the only place the pipeline retries on its own schedule;
//! steady-state failures are retried by the next loop iteration instead.

use std::time::Duration;

use rand::Rng;

use super::config::ConnectSettings;

/// Backoff parameters.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor applied after each attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Attempts allowed before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 5,
        }
    }
}

impl BackoffConfig {
    /// Build from connection settings.
    #[must_use]
    pub const fn from_connect_settings(settings: &ConnectSettings) -> Self {
        Self {
            initial_delay: settings.delay_initial,
            max_delay: settings.delay_max,
            multiplier: settings.delay_multiplier,
            jitter_factor: 0.1,
            max_attempts: settings.max_attempts,
        }
    }
}

/// Stateful backoff sequence.
///
/// # Example
///
/// ```rust
/// use price_stream::{BackoffConfig, BackoffPolicy};
///
/// let mut policy = BackoffPolicy::new(BackoffConfig::default());
/// assert!(policy.next_delay().is_some());
/// policy.reset();
/// assert_eq!(policy.attempt_count(), 0);
/// ```
#[derive(Debug)]
pub struct BackoffPolicy {
    config: BackoffConfig,
    next_base: Duration,
    attempts: u32,
}

impl BackoffPolicy {
    /// Start a fresh sequence.
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        let next_base = config.initial_delay;
        Self {
            config,
            next_base,
            attempts: 0,
        }
    }

    /// Delay to wait before the next attempt, or `None` once the attempt
    /// budget is spent.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }
        self.attempts += 1;

        let delay = self.jittered(self.next_base);
        self.next_base = self.grown(self.next_base);

        Some(delay)
    }

    /// `base * multiplier`, saturating at `max_delay`.
    fn grown(&self, base: Duration) -> Duration {
        let multiplier = self.config.multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return base.min(self.config.max_delay);
        }

        Duration::try_from_secs_f64(base.as_secs_f64() * multiplier)
            .map_or(self.config.max_delay, |d| d.min(self.config.max_delay))
    }

    /// Forget previous attempts.
    pub const fn reset(&mut self) {
        self.next_base = self.config.initial_delay;
        self.attempts = 0;
    }

    /// Attempts handed out so far.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempts
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempts < self.config.max_attempts
    }

    fn jittered(&self, base: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return base;
        }

        let spread = base.as_secs_f64() * self.config.jitter_factor;
        if !spread.is_finite() {
            return base;
        }
        let offset: f64 = rand::rng().random_range(-spread..=spread);
        Duration::try_from_secs_f64((base.as_secs_f64() + offset).max(0.001)).unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(
        initial_ms: u64,
        max_ms: u64,
        multiplier: f64,
        max_attempts: u32,
    ) -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            multiplier,
            jitter_factor: 0.0,
            max_attempts,
        }
    }

    #[test]
    fn default_config_values() {
        let config = BackoffConfig::default();
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert!((config.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn delays_grow_exponentially() {
        let mut policy = BackoffPolicy::new(no_jitter(100, 10_000, 2.0, 0));

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn delays_are_capped() {
        let mut policy = BackoffPolicy::new(no_jitter(1_000, 2_000, 4.0, 0));

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1_000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2_000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2_000)));
    }

    #[test]
    fn attempt_budget_is_enforced() {
        let mut policy = BackoffPolicy::new(no_jitter(10, 100, 2.0, 3));

        for expected in 1..=3 {
            assert!(policy.next_delay().is_some());
            assert_eq!(policy.attempt_count(), expected);
        }
        assert!(policy.next_delay().is_none());
        assert!(!policy.should_retry());
    }

    #[test]
    fn reset_restarts_the_sequence() {
        let mut policy = BackoffPolicy::new(no_jitter(100, 10_000, 2.0, 3));
        let _ = policy.next_delay();
        let _ = policy.next_delay();

        policy.reset();

        assert_eq!(policy.attempt_count(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for _ in 0..100 {
            let mut policy = BackoffPolicy::new(BackoffConfig {
                initial_delay: Duration::from_millis(1_000),
                jitter_factor: 0.1,
                max_attempts: 0,
                ..BackoffConfig::default()
            });

            let millis = policy.next_delay().unwrap().as_millis();
            assert!((900..=1_100).contains(&millis), "delay {millis}ms out of range");
        }
    }

    #[test]
    fn huge_multiplier_saturates_at_max_delay() {
        let mut policy = BackoffPolicy::new(no_jitter(500, 10_000, 1e20, 0));

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(500)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(10)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn huge_max_delay_does_not_overflow() {
        let mut policy = BackoffPolicy::new(BackoffConfig {
            initial_delay: Duration::from_secs(u64::MAX / 2),
            max_delay: Duration::MAX,
            multiplier: 10.0,
            jitter_factor: 0.1,
            max_attempts: 3,
        });

        for _ in 0..3 {
            assert!(policy.next_delay().is_some());
        }
    }

    #[test]
    fn non_finite_multiplier_keeps_delay_flat() {
        let mut policy = BackoffPolicy::new(no_jitter(100, 10_000, f64::NAN, 0));

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn from_connect_settings_copies_fields() {
        let settings = ConnectSettings {
            delay_initial: Duration::from_millis(250),
            delay_max: Duration::from_secs(3),
            delay_multiplier: 1.5,
            max_attempts: 7,
        };
        let config = BackoffConfig::from_connect_settings(&settings);
        assert_eq!(config.initial_delay, Duration::from_millis(250));
        assert_eq!(config.max_delay, Duration::from_secs(3));
        assert!((config.multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 7);
    }
}
