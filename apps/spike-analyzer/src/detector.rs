//! Spike Detection
//!
//! Single-step relative change against the last price seen for the same
//! symbol. The table is updated on every observation, spike or not, so
//! each tick is judged only against its immediate predecessor.

use std::collections::HashMap;
use std::fmt;

use price_stream::PriceTick;

/// Relative change above which a tick is a spike (5%).
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.05;

/// Relative change from `old` to `new`.
///
/// Callers must pass a finite, strictly positive `old`.
#[must_use]
pub fn relative_change(old: f64, new: f64) -> f64 {
    (new - old) / old
}

// =============================================================================
// Last Price Table
// =============================================================================

/// Most recent price per symbol.
///
/// Lives only in memory: a fresh table knows nothing, so the first tick of
/// every symbol after a restart is a first observation.
#[derive(Debug, Clone, Default)]
pub struct LastPriceTable {
    prices: HashMap<String, f64>,
}

impl LastPriceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored price for `symbol`, whatever its value.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    /// Usable comparison baseline for `symbol`.
    ///
    /// A stored price that is zero, negative or not finite would make the
    /// relative change meaningless, so it counts as no baseline at all.
    #[must_use]
    pub fn baseline(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Overwrite the price for `symbol`.
    pub fn record(&mut self, symbol: &str, price: f64) {
        if let Some(slot) = self.prices.get_mut(symbol) {
            *slot = price;
        } else {
            self.prices.insert(symbol.to_string(), price);
        }
    }

    /// Number of symbols seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no symbol has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

// =============================================================================
// Observations
// =============================================================================

/// Classification label, used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No prior price for the symbol.
    First,
    /// Change within the threshold.
    Stable,
    /// Change beyond the threshold.
    Spike,
}

impl Outcome {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Stable => "stable",
            Self::Spike => "spike",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price move that crossed the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeAlert {
    /// Ticker.
    pub symbol: String,
    /// Signed relative change, e.g. `-0.0526` for a 5.26% drop.
    pub change: f64,
    /// Price the tick was compared against.
    pub old_price: f64,
    /// Price carried by the tick.
    pub new_price: f64,
}

impl SpikeAlert {
    /// Signed change in percent.
    #[must_use]
    pub fn change_pct(&self) -> f64 {
        self.change * 100.0
    }
}

/// Result of classifying one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// First usable price for the symbol.
    First {
        /// Ticker.
        symbol: String,
        /// Price recorded.
        price: f64,
    },
    /// Within the threshold of the previous price.
    Stable {
        /// Ticker.
        symbol: String,
        /// Price recorded.
        price: f64,
        /// Signed relative change.
        change: f64,
    },
    /// Beyond the threshold.
    Spike(SpikeAlert),
}

impl Observation {
    /// Classification label.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::First { .. } => Outcome::First,
            Self::Stable { .. } => Outcome::Stable,
            Self::Spike(_) => Outcome::Spike,
        }
    }

    /// Ticker the observation is about.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::First { symbol, .. } | Self::Stable { symbol, .. } => symbol,
            Self::Spike(alert) => &alert.symbol,
        }
    }

    /// Whether this is a spike.
    #[must_use]
    pub const fn is_spike(&self) -> bool {
        matches!(self, Self::Spike(_))
    }
}

// =============================================================================
// Detector
// =============================================================================

/// Stateful classifier over a stream of ticks.
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    threshold: f64,
    table: LastPriceTable,
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SPIKE_THRESHOLD)
    }
}

impl SpikeDetector {
    /// Create a detector with an empty table.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            table: LastPriceTable::new(),
        }
    }

    /// Threshold on the absolute relative change.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The last-price table.
    #[must_use]
    pub const fn table(&self) -> &LastPriceTable {
        &self.table
    }

    /// Classify `tick` against the previous price for its symbol, then
    /// record its price.
    pub fn observe(&mut self, tick: &PriceTick) -> Observation {
        let symbol = tick.symbol();
        let new_price = tick.price();

        let observation = match self.table.baseline(symbol) {
            None => Observation::First {
                symbol: symbol.to_string(),
                price: new_price,
            },
            Some(old_price) => {
                let change = relative_change(old_price, new_price);
                if change.abs() > self.threshold {
                    Observation::Spike(SpikeAlert {
                        symbol: symbol.to_string(),
                        change,
                        old_price,
                        new_price,
                    })
                } else {
                    Observation::Stable {
                        symbol: symbol.to_string(),
                        price: new_price,
                        change,
                    }
                }
            }
        };

        self.table.record(symbol, new_price);
        observation
    }
}
