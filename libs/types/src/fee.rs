//! Fee schedule
//!
//! Pure table lookup: `(symbol, liquidity role) → (rate, fee currency)`.
//! Same inputs always produce the same outputs; no time dependence within
//! a trading session. The schedule is read-only after startup and is
//! snapshotted into each symbol engine.

use crate::ids::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which side of a trade an order was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityRole {
    /// Provided resting liquidity.
    Maker,
    /// Removed liquidity as the aggressor.
    Taker,
}

/// Fee rates for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
    /// Asset fees are denominated in (the symbol's quote asset).
    pub fee_currency: String,
}

impl FeeRates {
    pub fn rate_for(&self, role: LiquidityRole) -> Decimal {
        match role {
            LiquidityRole::Maker => self.maker_rate,
            LiquidityRole::Taker => self.taker_rate,
        }
    }
}

/// Static fee schedule over all hosted symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Rates applied when a symbol has no explicit entry.
    default_maker_rate: Decimal,
    default_taker_rate: Decimal,
    /// Per-symbol overrides.
    overrides: HashMap<String, FeeRates>,
}

impl FeeSchedule {
    /// Schedule with explicit default rates.
    pub fn new(default_maker_rate: Decimal, default_taker_rate: Decimal) -> Self {
        Self {
            default_maker_rate,
            default_taker_rate,
            overrides: HashMap::new(),
        }
    }

    /// Standard default tier: 0.10% maker, 0.20% taker.
    pub fn standard() -> Self {
        Self::new(
            Decimal::from_str_exact("0.0010").unwrap(),
            Decimal::from_str_exact("0.0020").unwrap(),
        )
    }

    /// Register explicit rates for one symbol.
    pub fn with_symbol(mut self, symbol: &Symbol, rates: FeeRates) -> Self {
        self.overrides.insert(symbol.as_str().to_string(), rates);
        self
    }

    /// Look up the rates in force for a symbol.
    pub fn rates(&self, symbol: &Symbol) -> FeeRates {
        self.overrides
            .get(symbol.as_str())
            .cloned()
            .unwrap_or_else(|| FeeRates {
                maker_rate: self.default_maker_rate,
                taker_rate: self.default_taker_rate,
                fee_currency: symbol.quote().to_string(),
            })
    }

    /// Look up a single rate: `(symbol, role) → (rate, fee_currency)`.
    pub fn lookup(&self, symbol: &Symbol, role: LiquidityRole) -> (Decimal, String) {
        let rates = self.rates(symbol);
        (rates.rate_for(role), rates.fee_currency)
    }
}
