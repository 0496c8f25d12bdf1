//! Combined order book for one symbol
//!
//! Two price-ordered halves plus the order index (order id → full resting
//! record). The index exists exactly for resting orders; it is created
//! when an order first rests, updated only on partial fill, and removed
//! when the order leaves the book for any reason.
//!
//! The book also records every price level it touches during a command;
//! the matcher drains that into the command's BookUpdate event.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::ask_book::AskBook;
use super::bid_book::BidBook;
use crate::events::LevelChange;

/// Best bid and offer with aggregate quantities at the top.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bbo {
    pub best_bid: Option<(Price, Quantity)>,
    pub best_ask: Option<(Price, Quantity)>,
}

impl Bbo {
    /// Absolute spread when both sides are populated.
    pub fn spread(&self) -> Option<Decimal> {
        match (&self.best_bid, &self.best_ask) {
            (Some((bid, _)), Some((ask, _))) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }
}

/// Result of filling the head maker at the best opposing level.
#[derive(Debug, Clone)]
pub struct HeadFill {
    pub maker_order_id: OrderId,
    /// Maker remaining quantity after the fill.
    pub maker_remaining: Quantity,
    /// Whether the maker was exhausted and left the book.
    pub maker_removed: bool,
}

/// Per-symbol limit order book with order index.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BidBook,
    asks: AskBook,
    /// Order index: resting orders only, keyed by order id.
    orders: HashMap<OrderId, Order>,
    /// Levels touched since the last `take_level_changes`, in touch order.
    touched: Vec<(Side, Price)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest an order at the tail of its price level and index it.
    ///
    /// # Panics
    /// Panics if the order is not eligible to rest (wrong type, terminal
    /// status, no price, or nothing remaining).
    pub fn insert_resting(&mut self, order: Order) {
        assert!(order.can_rest(), "only live priced limit orders may rest");
        let price = order.price.expect("resting order carries a price");

        match order.side {
            Side::Buy => self.bids.insert(
                order.order_id,
                order.submission_seq,
                price,
                order.remaining_quantity,
            ),
            Side::Sell => self.asks.insert(
                order.order_id,
                order.submission_seq,
                price,
                order.remaining_quantity,
            ),
        }
        self.touch(order.side, price);
        self.orders.insert(order.order_id, order);
    }

    /// Remove a resting order (cancel path).
    ///
    /// Returns the indexed order record, or None if the id is not resting.
    pub fn remove_resting(&mut self, order_id: &OrderId) -> Option<Order> {
        let order = self.orders.remove(order_id)?;
        let price = order.price.expect("indexed order carries a price");

        let removed = match order.side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        };
        debug_assert!(removed.is_some(), "index and level queues out of sync");

        self.touch(order.side, price);
        Some(order)
    }

    /// The best opposing level for an incoming taker:
    /// (price, head order id, head remaining quantity).
    pub fn best_opposing(&self, taker_side: Side) -> Option<(Price, OrderId, Quantity)> {
        let (price, level) = match taker_side {
            Side::Buy => self.asks.levels_best_first().next()?,
            Side::Sell => self.bids.levels_best_first().next()?,
        };
        let (head_id, head_qty) = level.peek_front()?;
        Some((price, head_id, head_qty))
    }

    /// Fill the head maker at the best opposing level by `quantity`.
    ///
    /// Keeps the level queue, the order index, and the maker record in
    /// sync; evicts the level when it empties.
    pub fn fill_best_opposing(
        &mut self,
        taker_side: Side,
        quantity: Quantity,
        timestamp: i64,
    ) -> HeadFill {
        let maker_side = taker_side.opposite();

        let (price, maker_order_id, popped) = match maker_side {
            Side::Buy => {
                let (price, level) = self
                    .bids
                    .best_level_mut()
                    .expect("fill against empty bid side");
                let (head_id, _) = level.peek_front().expect("fill against empty level");
                let popped = level.fill_front(quantity);
                (price, head_id, popped)
            }
            Side::Sell => {
                let (price, level) = self
                    .asks
                    .best_level_mut()
                    .expect("fill against empty ask side");
                let (head_id, _) = level.peek_front().expect("fill against empty level");
                let popped = level.fill_front(quantity);
                (price, head_id, popped)
            }
        };

        if popped {
            match maker_side {
                Side::Buy => self.bids.evict_best_if_empty(),
                Side::Sell => self.asks.evict_best_if_empty(),
            }
        }

        // Keep the maker's order record in step with its level entry.
        let maker = self
            .orders
            .get_mut(&maker_order_id)
            .expect("maker present in order index");
        maker.fill(quantity, timestamp);
        let maker_remaining = maker.remaining_quantity;

        let maker_removed = maker.is_filled();
        if maker_removed {
            self.orders.remove(&maker_order_id);
        }

        self.touch(maker_side, price);

        HeadFill {
            maker_order_id,
            maker_remaining,
            maker_removed,
        }
    }

    /// Opposing quantity reachable within an optional limit price
    /// (FOK feasibility view; non-mutating).
    pub fn opposing_volume_within(&self, taker_side: Side, limit: Option<Price>) -> Quantity {
        match taker_side {
            Side::Buy => self.asks.volume_within(limit),
            Side::Sell => self.bids.volume_within(limit),
        }
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    pub fn bbo(&self) -> Bbo {
        Bbo {
            best_bid: self.bids.best(),
            best_ask: self.asks.best(),
        }
    }

    /// Top-N levels per side, best first.
    pub fn depth(&self, depth: usize) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        (self.bids.depth_snapshot(depth), self.asks.depth_snapshot(depth))
    }

    /// Resting order lookup.
    pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Number of resting orders.
    pub fn resting_count(&self) -> usize {
        self.orders.len()
    }

    /// All resting order records (index consistency checks).
    pub fn resting_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Best-first level iteration for one side (invariant checks).
    pub fn side_levels(&self, side: Side) -> Vec<(Price, Vec<(OrderId, u64, Quantity)>)> {
        match side {
            Side::Buy => self
                .bids
                .levels_best_first()
                .map(|(p, l)| (p, l.entries().collect()))
                .collect(),
            Side::Sell => self
                .asks
                .levels_best_first()
                .map(|(p, l)| (p, l.entries().collect()))
                .collect(),
        }
    }

    /// Aggregate total at one price on one side (zero if absent).
    pub fn level_total(&self, side: Side, price: Price) -> Quantity {
        match side {
            Side::Buy => self.bids.level_total(price),
            Side::Sell => self.asks.level_total(price),
        }
    }

    /// A locked or crossed book after matching is an implementation bug.
    pub fn is_crossed(&self) -> bool {
        match (self.bids.best_price(), self.asks.best_price()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Drain the touched-level set into level changes, first-touch order,
    /// deduplicated, with current aggregate totals.
    pub fn take_level_changes(&mut self) -> Vec<LevelChange> {
        let mut seen: Vec<(Side, Price)> = Vec::new();
        let mut changes = Vec::new();

        for (side, price) in self.touched.drain(..) {
            if seen.contains(&(side, price)) {
                continue;
            }
            seen.push((side, price));

            let new_total = match side {
                Side::Buy => self.bids.level_total(price),
                Side::Sell => self.asks.level_total(price),
            };
            changes.push(LevelChange {
                side,
                price,
                new_total_quantity: new_total,
            });
        }
        changes
    }

    fn touch(&mut self, side: Side, price: Price) {
        self.touched.push((side, price));
    }
}
