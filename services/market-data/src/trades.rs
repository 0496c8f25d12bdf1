//! Public trade tape
//!
//! Bounded ring of recent trade prints per symbol, for late subscribers
//! and recent-trades queries. Only public fields are kept; fee rates
//! travel on the feed message, account attribution never does.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{Symbol, TradeId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// A public trade record on the tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeEntry {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    /// Notional value (price × quantity).
    pub value: Decimal,
    pub taker_side: Side,
    pub timestamp: i64,
    pub seq: u64,
}

/// Bounded history of recent public trades.
#[derive(Debug)]
pub struct TradeTape {
    symbol: Symbol,
    history: VecDeque<TapeEntry>,
    max_history: usize,
}

impl TradeTape {
    pub fn new(symbol: Symbol, max_history: usize) -> Self {
        Self {
            symbol,
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Record an engine trade, evicting the oldest entry at capacity.
    pub fn record(&mut self, trade: &Trade) -> TapeEntry {
        let entry = TapeEntry {
            trade_id: trade.trade_id,
            symbol: self.symbol.clone(),
            price: trade.price,
            quantity: trade.quantity,
            value: trade.value(),
            taker_side: trade.aggressor_side,
            timestamp: trade.timestamp,
            seq: trade.sequence,
        };

        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(entry.clone());
        entry
    }

    /// Most recent trades, newest first.
    pub fn recent(&self, limit: usize) -> Vec<TapeEntry> {
        self.history.iter().rev().take(limit).cloned().collect()
    }

    /// The whole cached window, oldest first.
    pub fn replay_window(&self) -> Vec<TapeEntry> {
        self.history.iter().cloned().collect()
    }

    /// Find a cached trade by id.
    pub fn get(&self, trade_id: TradeId) -> Option<&TapeEntry> {
        self.history.iter().find(|t| t.trade_id == trade_id)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}
