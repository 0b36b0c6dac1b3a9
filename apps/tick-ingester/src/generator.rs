//! Synthetic Tick Generator
//!
//! Draws ticks uniformly at random: the symbol from a fixed universe, the
//! price from a half-open range `[min, max)`. Draws are independent, so
//! consecutive prices for a symbol can jump by any amount within the range.

use std::ops::Range;

use price_stream::{PriceTick, TickError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Symbols used when none are configured.
pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "TSLA", "NVDA", "MSFT", "GOOGL"];

/// Default price range.
pub const DEFAULT_PRICE_RANGE: Range<f64> = 100.0..600.0;

/// Errors raised when configuring a generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The symbol universe is empty.
    #[error("symbol universe cannot be empty")]
    NoSymbols,

    /// A symbol in the universe is blank.
    #[error("symbol universe contains a blank symbol")]
    BlankSymbol,

    /// The price range cannot produce valid ticks.
    #[error("invalid price range {min}..{max}: need 0 < min < max, both finite")]
    InvalidRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Random tick source.
#[derive(Debug)]
pub struct TickGenerator {
    symbols: Vec<String>,
    prices: Range<f64>,
    rng: StdRng,
}

impl TickGenerator {
    /// Create a generator seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the universe or range is unusable.
    pub fn new(symbols: Vec<String>, prices: Range<f64>) -> Result<Self, GeneratorError> {
        Self::with_rng(symbols, prices, StdRng::from_os_rng())
    }

    /// Create a deterministic generator.
    ///
    /// # Errors
    ///
    /// Same as [`TickGenerator::new`].
    pub fn with_seed(
        symbols: Vec<String>,
        prices: Range<f64>,
        seed: u64,
    ) -> Result<Self, GeneratorError> {
        Self::with_rng(symbols, prices, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        symbols: Vec<String>,
        prices: Range<f64>,
        rng: StdRng,
    ) -> Result<Self, GeneratorError> {
        if symbols.is_empty() {
            return Err(GeneratorError::NoSymbols);
        }
        if symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(GeneratorError::BlankSymbol);
        }
        let valid_range = prices.start.is_finite()
            && prices.end.is_finite()
            && prices.start > 0.0
            && prices.start < prices.end;
        if !valid_range {
            return Err(GeneratorError::InvalidRange {
                min: prices.start,
                max: prices.end,
            });
        }

        Ok(Self {
            symbols,
            prices,
            rng,
        })
    }

    /// The symbol universe.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The price range.
    #[must_use]
    pub const fn prices(&self) -> &Range<f64> {
        &self.prices
    }

    /// Draw the next tick, stamped with the current wall-clock second.
    ///
    /// # Errors
    ///
    /// Only if the drawn values violate the tick invariants, which the
    /// constructor's validation rules out.
    pub fn next_tick(&mut self) -> Result<PriceTick, TickError> {
        let index = self.rng.random_range(0..self.symbols.len());
        let price = self.rng.random_range(self.prices.clone());
        PriceTick::now(self.symbols[index].clone(), price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn rejects_empty_universe() {
        assert!(matches!(
            TickGenerator::new(vec![], DEFAULT_PRICE_RANGE),
            Err(GeneratorError::NoSymbols)
        ));
    }

    #[test]
    fn rejects_blank_symbol() {
        assert!(matches!(
            TickGenerator::new(vec!["AAPL".into(), " ".into()], DEFAULT_PRICE_RANGE),
            Err(GeneratorError::BlankSymbol)
        ));
    }

    #[test]
    fn rejects_unusable_ranges() {
        for range in [0.0..10.0, -5.0..10.0, 10.0..10.0, 20.0..10.0, 1.0..f64::INFINITY] {
            assert!(
                matches!(
                    TickGenerator::new(universe(), range.clone()),
                    Err(GeneratorError::InvalidRange { .. })
                ),
                "{range:?} should be rejected"
            );
        }
    }

    #[test]
    fn ticks_stay_within_universe_and_range() {
        let mut generator = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 7).unwrap();

        for _ in 0..1_000 {
            let tick = generator.next_tick().unwrap();
            assert!(DEFAULT_SYMBOLS.contains(&tick.symbol()));
            assert!(DEFAULT_PRICE_RANGE.contains(&tick.price()));
        }
    }

    #[test]
    fn every_symbol_is_eventually_drawn() {
        let mut generator = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 11).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(generator.next_tick().unwrap().symbol().to_string());
        }
        assert_eq!(seen.len(), DEFAULT_SYMBOLS.len());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 42).unwrap();
        let mut b = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 42).unwrap();

        for _ in 0..20 {
            let (x, y) = (a.next_tick().unwrap(), b.next_tick().unwrap());
            assert_eq!(x.symbol(), y.symbol());
            assert_eq!(x.price(), y.price());
        }
    }
}
