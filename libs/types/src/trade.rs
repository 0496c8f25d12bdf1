//! Trade execution record
//!
//! A trade is the atomic exchange between a resting maker and an
//! aggressing taker. It always prints at the maker's resting price and
//! carries the fee *rates* in force at emission; fee accounting is
//! downstream.

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Per-symbol monotonic trade id.
    pub trade_id: TradeId,
    /// Per-symbol event sequence number.
    pub sequence: u64,
    pub symbol: Symbol,

    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    /// Taker side; the taker is always the aggressor.
    pub aggressor_side: Side,
    /// Execution price: the maker's resting price, never the taker's.
    pub price: Price,
    pub quantity: Quantity,

    /// Fee rates looked up at emission, never recomputed later.
    pub maker_fee_rate: Decimal,
    pub taker_fee_rate: Decimal,
    pub fee_currency: String,

    /// Engine-local monotonic nanoseconds.
    pub timestamp: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        sequence: u64,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        aggressor_side: Side,
        price: Price,
        quantity: Quantity,
        maker_fee_rate: Decimal,
        taker_fee_rate: Decimal,
        fee_currency: String,
        timestamp: i64,
    ) -> Self {
        Self {
            trade_id,
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            aggressor_side,
            price,
            quantity,
            maker_fee_rate,
            taker_fee_rate,
            fee_currency,
            timestamp,
        }
    }

    /// Notional value (price × quantity) in the quote asset.
    pub fn value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Maker fee amount implied by the recorded rate.
    pub fn maker_fee_amount(&self) -> Decimal {
        self.value() * self.maker_fee_rate
    }

    /// Taker fee amount implied by the recorded rate.
    pub fn taker_fee_amount(&self) -> Decimal {
        self.value() * self.taker_fee_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        Trade::new(
            TradeId::new(1),
            10,
            Symbol::new("BTC/USD"),
            OrderId::new(),
            OrderId::new(),
            Side::Buy,
            Price::from_str("100.00").unwrap(),
            Quantity::from_str("0.5").unwrap(),
            Decimal::from_str_exact("0.0010").unwrap(),
            Decimal::from_str_exact("0.0020").unwrap(),
            "USD".to_string(),
            1_000,
        )
    }

    #[test]
    fn test_trade_value() {
        let trade = sample_trade();
        assert_eq!(trade.value(), Decimal::from(50));
    }

    #[test]
    fn test_fee_amounts() {
        let trade = sample_trade();
        assert_eq!(trade.maker_fee_amount(), Decimal::from_str_exact("0.0500").unwrap());
        assert_eq!(trade.taker_fee_amount(), Decimal::from_str_exact("0.1000").unwrap());
    }

    #[test]
    fn test_trade_serialization() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        // Decimal fields travel as strings
        assert!(json.contains("\"price\":\"100.00\""));
        assert!(json.contains("\"quantity\":\"0.5\""));

        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
