//! Per-symbol trading parameters
//!
//! A `SymbolSpec` carries everything admission needs to validate an
//! incoming order: tick size, lot size, and the fee-denominating quote
//! asset. Specs are read-only after startup.

use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static trading parameters for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: Symbol,
    /// Minimum price increment. All prices must be exact multiples.
    pub tick_size: Decimal,
    /// Minimum quantity increment. All quantities must be exact multiples.
    pub lot_size: Decimal,
}

impl SymbolSpec {
    /// Create a spec, asserting positive increments.
    pub fn new(symbol: Symbol, tick_size: Decimal, lot_size: Decimal) -> Self {
        assert!(tick_size > Decimal::ZERO, "tick size must be positive");
        assert!(lot_size > Decimal::ZERO, "lot size must be positive");
        Self {
            symbol,
            tick_size,
            lot_size,
        }
    }

    /// Whether a price conforms to this symbol's tick grid.
    pub fn price_conforms(&self, price: Price) -> bool {
        price.is_multiple_of(self.tick_size)
    }

    /// Whether a quantity conforms to this symbol's lot grid.
    pub fn quantity_conforms(&self, quantity: Quantity) -> bool {
        quantity.is_multiple_of(self.lot_size)
    }

    /// The asset fees are charged in.
    pub fn fee_currency(&self) -> &str {
        self.symbol.quote()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn btc_usd() -> SymbolSpec {
        SymbolSpec::new(
            Symbol::new("BTC/USD"),
            Decimal::from_str("0.01").unwrap(),
            Decimal::from_str("0.001").unwrap(),
        )
    }

    #[test]
    fn test_price_conformance() {
        let spec = btc_usd();
        assert!(spec.price_conforms(Price::from_str("100.00").unwrap()));
        assert!(spec.price_conforms(Price::from_str("99.99").unwrap()));
        assert!(!spec.price_conforms(Price::from_str("100.005").unwrap()));
    }

    #[test]
    fn test_quantity_conformance() {
        let spec = btc_usd();
        assert!(spec.quantity_conforms(Quantity::from_str("1.000").unwrap()));
        assert!(spec.quantity_conforms(Quantity::from_str("0.001").unwrap()));
        assert!(!spec.quantity_conforms(Quantity::from_str("0.0005").unwrap()));
    }

    #[test]
    fn test_fee_currency_is_quote() {
        assert_eq!(btc_usd().fee_currency(), "USD");
    }

    #[test]
    #[should_panic(expected = "tick size must be positive")]
    fn test_zero_tick_panics() {
        SymbolSpec::new(Symbol::new("BTC/USD"), Decimal::ZERO, Decimal::ONE);
    }
}
