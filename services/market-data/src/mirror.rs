//! Aggregate book mirror
//!
//! Maintains per-side level aggregates from the engine's book updates.
//! This is the fanout's source of truth for snapshots and BBO derivation;
//! it never sees individual orders. BTreeMap keeps iteration
//! deterministic.

use std::collections::BTreeMap;

use matching_engine::events::BookUpdate;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::order::Side;

/// Aggregate mirror of one symbol's book.
#[derive(Debug, Clone)]
pub struct BookMirror {
    pub symbol: Symbol,
    /// Bid levels; best bid is the highest key.
    bids: BTreeMap<Price, Quantity>,
    /// Ask levels; best ask is the lowest key.
    asks: BTreeMap<Price, Quantity>,
    /// Sequence of the last applied update.
    last_sequence: u64,
}

impl BookMirror {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_sequence: 0,
        }
    }

    /// Apply one book update; zero-quantity changes remove the level.
    pub fn apply(&mut self, update: &BookUpdate) {
        for change in &update.changes {
            let levels = match change.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if change.new_total_quantity.is_zero() {
                levels.remove(&change.price);
            } else {
                levels.insert(change.price, change.new_total_quantity);
            }
        }
        self.last_sequence = update.sequence;
    }

    /// Bid levels, best (highest) first.
    pub fn bid_levels(&self) -> Vec<(Price, Quantity)> {
        self.bids.iter().rev().map(|(p, q)| (*p, *q)).collect()
    }

    /// Ask levels, best (lowest) first.
    pub fn ask_levels(&self) -> Vec<(Price, Quantity)> {
        self.asks.iter().map(|(p, q)| (*p, *q)).collect()
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.iter().next_back().map(|(p, q)| (*p, *q))
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.iter().next().map(|(p, q)| (*p, *q))
    }

    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }
}
