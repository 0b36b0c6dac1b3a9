//! Price Tick Wire Format
//!
//! A tick is one price observation for one symbol at one point in time.
//! It travels through the stream as a UTF-8 JSON object carried in a single
//! entry field:
//!
//! ```json
//! {"symbol":"AAPL","price":187.42,"timestamp":1718000000}
//! ```
//!
//! Field names are case-sensitive. Unknown fields are ignored on decode so
//! producers can add fields without breaking older consumers; a missing
//! required field is a decode failure.

use serde::{Deserialize, Serialize};

/// Errors raised when building or decoding a [`PriceTick`].
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Symbol was empty.
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Price was zero, negative, NaN or infinite.
    #[error("price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    /// Payload was not a well-formed tick object.
    #[error("malformed tick payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw wire shape, before invariants are checked.
#[derive(Debug, Deserialize)]
struct WireTick {
    symbol: String,
    price: f64,
    timestamp: i64,
}

/// One price observation.
///
/// Invariants: `symbol` is non-empty and `price` is finite and strictly
/// positive. Both are enforced by [`PriceTick::new`] and by every decode
/// path, so a `PriceTick` in hand is always valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireTick")]
pub struct PriceTick {
    symbol: String,
    price: f64,
    timestamp: i64,
}

impl PriceTick {
    /// Create a tick, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::EmptySymbol`] or [`TickError::InvalidPrice`].
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: i64) -> Result<Self, TickError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(TickError::EmptySymbol);
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(TickError::InvalidPrice(price));
        }
        Ok(Self {
            symbol,
            price,
            timestamp,
        })
    }

    /// Create a tick stamped with the current wall-clock second.
    ///
    /// # Errors
    ///
    /// Same as [`PriceTick::new`].
    pub fn now(symbol: impl Into<String>, price: f64) -> Result<Self, TickError> {
        Self::new(symbol, price, chrono::Utc::now().timestamp())
    }

    /// Ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Price in the pipeline's single currency unit.
    #[must_use]
    pub const fn price(&self) -> f64 {
        self.price
    }

    /// Seconds since the Unix epoch, set by the producer.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Encode to the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, TickError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON wire format.
    ///
    /// Shape errors surface as [`TickError::Malformed`]; invariant
    /// violations keep their own variants so they stay distinguishable in
    /// logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid tick.
    pub fn decode(payload: &str) -> Result<Self, TickError> {
        let wire: WireTick = serde_json::from_str(payload)?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireTick> for PriceTick {
    type Error = TickError;

    fn try_from(wire: WireTick) -> Result<Self, Self::Error> {
        Self::new(wire.symbol, wire.price, wire.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_symbol() {
        assert!(matches!(
            PriceTick::new("", 100.0, 0),
            Err(TickError::EmptySymbol)
        ));
    }

    #[test]
    fn new_rejects_non_positive_and_non_finite_prices() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    PriceTick::new("AAPL", price, 0),
                    Err(TickError::InvalidPrice(_))
                ),
                "price {price} should be rejected"
            );
        }
    }

    #[test]
    fn encode_uses_fixed_field_names() {
        let tick = PriceTick::new("AAPL", 187.5, 1_718_000_000).unwrap();
        let value: serde_json::Value = serde_json::from_str(&tick.encode().unwrap()).unwrap();

        assert_eq!(value["symbol"], "AAPL");
        assert_eq!(value["price"], 187.5);
        assert_eq!(value["timestamp"], 1_718_000_000);
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let tick = PriceTick::decode(
            r#"{"symbol":"TSLA","price":250.25,"timestamp":1700000000,"venue":"XNAS"}"#,
        )
        .unwrap();

        assert_eq!(tick.symbol(), "TSLA");
        assert_eq!(tick.price(), 250.25);
        assert_eq!(tick.timestamp(), 1_700_000_000);
    }

    #[test]
    fn decode_accepts_integer_price() {
        let tick = PriceTick::decode(r#"{"symbol":"MSFT","price":400,"timestamp":1}"#).unwrap();
        assert_eq!(tick.price(), 400.0);
    }

    #[test]
    fn decode_requires_every_field() {
        for payload in [
            r#"{"price":1.0,"timestamp":1}"#,
            r#"{"symbol":"AAPL","timestamp":1}"#,
            r#"{"symbol":"AAPL","price":1.0}"#,
        ] {
            assert!(
                matches!(PriceTick::decode(payload), Err(TickError::Malformed(_))),
                "{payload} should fail to decode"
            );
        }
    }

    #[test]
    fn decode_field_names_are_case_sensitive() {
        let result = PriceTick::decode(r#"{"Symbol":"AAPL","Price":1.0,"Timestamp":1}"#);
        assert!(matches!(result, Err(TickError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_wrong_types() {
        let result = PriceTick::decode(r#"{"symbol":"AAPL","price":"1.0","timestamp":1}"#);
        assert!(matches!(result, Err(TickError::Malformed(_))));

        let result = PriceTick::decode(r#"{"symbol":"AAPL","price":1.0,"timestamp":1.5}"#);
        assert!(matches!(result, Err(TickError::Malformed(_))));
    }

    #[test]
    fn decode_enforces_price_invariant() {
        let result = PriceTick::decode(r#"{"symbol":"AAPL","price":0,"timestamp":1}"#);
        assert!(matches!(result, Err(TickError::InvalidPrice(p)) if p == 0.0));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(matches!(
            PriceTick::decode("not json"),
            Err(TickError::Malformed(_))
        ));
    }

    #[test]
    fn serde_deserialize_also_validates() {
        let result: Result<PriceTick, _> =
            serde_json::from_str(r#"{"symbol":"","price":1.0,"timestamp":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn now_stamps_current_second() {
        let before = chrono::Utc::now().timestamp();
        let tick = PriceTick::now("NVDA", 120.0).unwrap();
        let after = chrono::Utc::now().timestamp();
        assert!((before..=after).contains(&tick.timestamp()));
    }
}
