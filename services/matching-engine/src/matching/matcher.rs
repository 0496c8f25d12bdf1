//! The matching algorithm
//!
//! Single entry point applying one admitted order to the book per its
//! type semantics. All fills print at the maker's resting price, so a
//! taker never trades through a better available level and any price
//! improvement accrues to it. Fee rates are looked up at trade emission.

use tracing::debug;
use types::errors::RejectReason;
use types::fee::{FeeRates, FeeSchedule};
use types::ids::Symbol;
use types::numeric::Price;
use types::order::{CancelReason, Order, OrderType, Side};
use types::trade::Trade;

use crate::book::OrderBook;
use crate::matching::crossing;
use crate::sequencer::Sequencer;

/// Result of applying one order.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Trades in emission order (maker price, FIFO makers).
    pub trades: Vec<Trade>,
    /// Whether the order's residual now rests on the book.
    pub rested: bool,
}

/// Per-symbol matcher with the fee rates snapshotted at startup.
#[derive(Debug, Clone)]
pub struct Matcher {
    symbol: Symbol,
    fees: FeeRates,
}

impl Matcher {
    pub fn new(symbol: Symbol, schedule: &FeeSchedule) -> Self {
        let fees = schedule.rates(&symbol);
        Self { symbol, fees }
    }

    /// Apply an admitted order to the book.
    ///
    /// On return the order carries its final (or resting) status and the
    /// book holds any residual that rests. The caller drains the book's
    /// level changes for the command's BookUpdate event.
    pub fn apply(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        timestamp: i64,
    ) -> MatchOutcome {
        match order.order_type {
            OrderType::Limit => self.apply_limit(book, sequencer, order, timestamp),
            OrderType::Market => self.apply_market(book, sequencer, order, timestamp),
            OrderType::Ioc => self.apply_ioc(book, sequencer, order, timestamp),
            OrderType::Fok => self.apply_fok(book, sequencer, order, timestamp),
        }
    }

    /// Limit: walk within the limit, rest the residual at the limit price.
    fn apply_limit(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        timestamp: i64,
    ) -> MatchOutcome {
        let trades = self.walk(book, sequencer, order, order.price, timestamp);

        let rested = if !order.remaining_quantity.is_zero() {
            book.insert_resting(order.clone());
            true
        } else {
            false
        };

        MatchOutcome { trades, rested }
    }

    /// Market: unbounded walk, never rests; residual is cancelled.
    fn apply_market(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        timestamp: i64,
    ) -> MatchOutcome {
        let trades = self.walk(book, sequencer, order, None, timestamp);

        if !order.remaining_quantity.is_zero() {
            order.exhaust_liquidity(timestamp);
        }

        MatchOutcome {
            trades,
            rested: false,
        }
    }

    /// IOC: limit walk, residual cancelled instead of rested.
    fn apply_ioc(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        timestamp: i64,
    ) -> MatchOutcome {
        let trades = self.walk(book, sequencer, order, order.price, timestamp);

        if !order.remaining_quantity.is_zero() {
            order.cancel(CancelReason::IocResidual, timestamp);
        }

        MatchOutcome {
            trades,
            rested: false,
        }
    }

    /// FOK: non-mutating feasibility scan, then all-or-nothing execution.
    ///
    /// The scan and execution run inside the symbol's serialized command
    /// processing, so no interleaving command can invalidate the scan.
    fn apply_fok(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        timestamp: i64,
    ) -> MatchOutcome {
        let available = book.opposing_volume_within(order.side, order.price);

        if available.as_decimal() < order.remaining_quantity.as_decimal() {
            debug!(
                symbol = %self.symbol,
                order_id = %order.order_id,
                %available,
                requested = %order.remaining_quantity,
                "FOK infeasible, leaving book untouched"
            );
            order.reject(RejectReason::InsufficientLiquidity, timestamp);
            return MatchOutcome {
                trades: Vec::new(),
                rested: false,
            };
        }

        let outcome = self.apply_ioc(book, sequencer, order, timestamp);
        debug_assert!(
            order.is_filled(),
            "feasible FOK must fill completely under serialized processing"
        );
        outcome
    }

    /// Walk the opposing side best-first, filling against each level's
    /// FIFO head at the maker's price, bounded by `limit` if given.
    fn walk(
        &self,
        book: &mut OrderBook,
        sequencer: &mut Sequencer,
        order: &mut Order,
        limit: Option<Price>,
        timestamp: i64,
    ) -> Vec<Trade> {
        let mut trades = Vec::new();

        while !order.remaining_quantity.is_zero() {
            let Some((level_price, _, head_quantity)) = book.best_opposing(order.side) else {
                break;
            };
            if !crossing::price_allows(order.side, limit, level_price) {
                break;
            }

            let fill_quantity = order.remaining_quantity.min(head_quantity);
            let head = book.fill_best_opposing(order.side, fill_quantity, timestamp);
            order.fill(fill_quantity, timestamp);

            let trade = Trade::new(
                sequencer.next_trade_id(),
                sequencer.next_sequence(),
                self.symbol.clone(),
                head.maker_order_id,
                order.order_id,
                order.side,
                level_price, // maker sets the price
                fill_quantity,
                self.fees.maker_rate,
                self.fees.taker_rate,
                self.fees.fee_currency.clone(),
                timestamp,
            );
            trades.push(trade);
        }

        trades
    }
}
