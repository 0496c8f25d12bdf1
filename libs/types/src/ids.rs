//! Unique identifier types for engine entities
//!
//! Order ids use UUID v7 for time-sortable ordering; trade ids are plain
//! per-symbol monotonic counters assigned by the event sequencer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an order, assigned at admission.
///
/// UUID v7 embeds a timestamp, so order ids sort roughly in creation
/// order across symbols without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new OrderId with the current timestamp.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trade.
///
/// Monotonic within a symbol; the sequencer owns the counter. Distinct
/// from the event sequence number, which also covers book deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(u64);

impl TradeId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trading symbol (pair) identifier.
///
/// Format: "BASE/QUOTE" (e.g., "BTC/USD", "ETH/USDC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol from a string.
    ///
    /// # Panics
    /// Panics if the format is invalid (must contain '/')
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(s.contains('/'), "Symbol must be in BASE/QUOTE format");
        Self(s)
    }

    /// Try to create a Symbol, returning None if invalid.
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.contains('/') {
            Some(Self(s))
        } else {
            None
        }
    }

    /// Get the symbol string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into base and quote assets.
    pub fn split(&self) -> (&str, &str) {
        let mut parts = self.0.splitn(2, '/');
        (parts.next().unwrap_or(""), parts.next().unwrap_or(""))
    }

    /// The quote asset, in which fees are denominated.
    pub fn quote(&self) -> &str {
        self.split().1
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_unique() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_trade_id_ordering() {
        assert!(TradeId::new(1) < TradeId::new(2));
        assert_eq!(TradeId::new(7).value(), 7);
    }

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new("BTC/USD");
        assert_eq!(symbol.as_str(), "BTC/USD");

        let (base, quote) = symbol.split();
        assert_eq!(base, "BTC");
        assert_eq!(quote, "USD");
        assert_eq!(symbol.quote(), "USD");
    }

    #[test]
    fn test_symbol_try_new() {
        assert!(Symbol::try_new("BTC/USD").is_some());
        assert!(Symbol::try_new("INVALID").is_none());
    }

    #[test]
    #[should_panic(expected = "Symbol must be in BASE/QUOTE format")]
    fn test_symbol_invalid_format() {
        Symbol::new("INVALID");
    }

    #[test]
    fn test_symbol_serialization() {
        let symbol = Symbol::new("ETH/USDC");
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"ETH/USDC\"");

        let deserialized: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(symbol, deserialized);
    }
}
