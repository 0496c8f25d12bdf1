//! Ask (sell-side) half of the book
//!
//! Sell orders sorted by price ascending (best ask first). Uses BTreeMap
//! for deterministic iteration; best access is the map's first key.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};

use super::price_level::PriceLevel;

/// Ask (sell) side of the order book.
///
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    /// Price levels; ascending order means the best ask is the first key.
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at the tail of its price level.
    pub fn insert(&mut self, order_id: OrderId, submission_seq: u64, price: Price, quantity: Quantity) {
        self.levels
            .entry(price)
            .or_default()
            .append(order_id, submission_seq, quantity);
    }

    /// Remove an order; drops the level when it empties.
    ///
    /// Returns the removed remaining quantity if found.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Quantity> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(removed)
    }

    /// Best ask (lowest price) with its aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Mutable access to the best level (matching walks start here).
    pub(crate) fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels
            .iter_mut()
            .next()
            .map(|(price, level)| (*price, level))
    }

    /// Drop the best level if it has emptied.
    pub(crate) fn evict_best_if_empty(&mut self) {
        let emptied = self
            .levels
            .iter()
            .next()
            .filter(|(_, level)| level.is_empty())
            .map(|(price, _)| *price);
        if let Some(price) = emptied {
            self.levels.remove(&price);
        }
    }

    /// Sum of resting quantity at prices `<= limit` (best-first scan),
    /// or the whole side when no limit is given.
    ///
    /// This is the FOK feasibility view for an incoming buy.
    pub fn volume_within(&self, limit: Option<Price>) -> Quantity {
        let mut total = Quantity::zero();
        for (price, level) in self.levels.iter() {
            if let Some(limit) = limit {
                if *price > limit {
                    break;
                }
            }
            total = total + level.total_quantity();
        }
        total
    }

    /// Aggregate total at one price (zero if the level is absent).
    pub fn level_total(&self, price: Price) -> Quantity {
        self.levels
            .get(&price)
            .map(|l| l.total_quantity())
            .unwrap_or_else(Quantity::zero)
    }

    /// Top-N levels, best first.
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Best-first iteration over levels, for invariant checks.
    pub fn levels_best_first(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().map(|(price, level)| (*price, level))
    }
}
