//! Wire messages for the three public feed channels
//!
//! Every decimal travels as a string; level lists are `[price, quantity]`
//! pairs with a zero quantity signalling level removal. Each message
//! carries the engine's per-symbol sequence position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{Symbol, TradeId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

use matching_engine::events::BookUpdate;

/// The three logical feed channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Orderbook,
    Trades,
    Bbo,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Orderbook => "orderbook",
            Channel::Trades => "trades",
            Channel::Bbo => "bbo",
        }
    }
}

/// A message on one of the public channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Public trade print (`trades` channel).
    Trade {
        symbol: Symbol,
        trade_id: TradeId,
        price: Price,
        quantity: Quantity,
        aggressor_side: Side,
        maker_fee: Decimal,
        taker_fee: Decimal,
        fee_currency: String,
        timestamp: i64,
        seq: u64,
    },
    /// Book snapshot or delta (`orderbook` channel). A snapshot lists the
    /// whole book; a delta lists only the changed levels.
    OrderbookUpdate {
        symbol: Symbol,
        bids: Vec<(Price, Quantity)>,
        asks: Vec<(Price, Quantity)>,
        timestamp: i64,
        seq: u64,
    },
    /// Top-of-book change (`bbo` channel).
    BboUpdate {
        symbol: Symbol,
        best_bid: Option<Price>,
        best_bid_qty: Option<Quantity>,
        best_ask: Option<Price>,
        best_ask_qty: Option<Quantity>,
        #[serde(skip_serializing_if = "Option::is_none")]
        spread: Option<Decimal>,
        timestamp: i64,
        seq: u64,
    },
}

impl FeedMessage {
    /// The channel this message belongs to.
    pub fn channel(&self) -> Channel {
        match self {
            FeedMessage::Trade { .. } => Channel::Trades,
            FeedMessage::OrderbookUpdate { .. } => Channel::Orderbook,
            FeedMessage::BboUpdate { .. } => Channel::Bbo,
        }
    }

    /// The sequence position stamped on this message.
    pub fn seq(&self) -> u64 {
        match self {
            FeedMessage::Trade { seq, .. } => *seq,
            FeedMessage::OrderbookUpdate { seq, .. } => *seq,
            FeedMessage::BboUpdate { seq, .. } => *seq,
        }
    }

    /// Build the public trade print from an engine trade.
    pub fn from_trade(trade: &Trade) -> Self {
        FeedMessage::Trade {
            symbol: trade.symbol.clone(),
            trade_id: trade.trade_id,
            price: trade.price,
            quantity: trade.quantity,
            aggressor_side: trade.aggressor_side,
            maker_fee: trade.maker_fee_rate,
            taker_fee: trade.taker_fee_rate,
            fee_currency: trade.fee_currency.clone(),
            timestamp: trade.timestamp,
            seq: trade.sequence,
        }
    }

    /// Build the delta message from an engine book update.
    pub fn from_book_update(update: &BookUpdate) -> Self {
        let mut bids = Vec::new();
        let mut asks = Vec::new();
        for change in &update.changes {
            let entry = (change.price, change.new_total_quantity);
            match change.side {
                Side::Buy => bids.push(entry),
                Side::Sell => asks.push(entry),
            }
        }
        FeedMessage::OrderbookUpdate {
            symbol: update.symbol.clone(),
            bids,
            asks,
            timestamp: update.timestamp,
            seq: update.sequence,
        }
    }
}
