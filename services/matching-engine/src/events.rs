//! Sequenced engine events
//!
//! Every event carries the per-symbol sequence number assigned by the
//! sequencer at emission. The stream, in sequence order, is the
//! authoritative record of the engine: market-data fanout consumes it
//! live, and replay consumes a journal of it at startup.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{CancelReason, Side};
use types::trade::Trade;

/// A change to one price level's aggregate quantity.
///
/// `new_total_quantity` of zero signals level removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelChange {
    pub side: Side,
    pub price: Price,
    pub new_total_quantity: Quantity,
}

impl LevelChange {
    /// Whether this change removes the level entirely.
    pub fn is_removal(&self) -> bool {
        self.new_total_quantity.is_zero()
    }
}

/// Compact book diff emitted after each command that changed the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub symbol: Symbol,
    pub sequence: u64,
    pub timestamp: i64,
    pub changes: Vec<LevelChange>,
}

/// An order began resting on the book.
///
/// Carries enough to reconstruct the FIFO position on replay: events are
/// consumed in sequence order and the submission sequence is the level's
/// time key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub symbol: Symbol,
    pub sequence: u64,
    pub timestamp: i64,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity resting at acceptance (post any immediate fills).
    pub quantity: Quantity,
    pub submission_seq: u64,
}

/// A resting order left the book without (further) fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub symbol: Symbol,
    pub sequence: u64,
    pub timestamp: i64,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub cancelled_quantity: Quantity,
    pub reason: CancelReason,
}

/// All events emitted by a symbol engine, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EngineEvent {
    #[serde(rename = "order_accepted")]
    OrderAccepted(OrderAccepted),
    #[serde(rename = "trade")]
    Trade(Trade),
    #[serde(rename = "book_update")]
    BookUpdate(BookUpdate),
    #[serde(rename = "order_cancelled")]
    OrderCancelled(OrderCancelled),
}

impl EngineEvent {
    /// The per-symbol sequence number stamped on this event.
    pub fn sequence(&self) -> u64 {
        match self {
            EngineEvent::OrderAccepted(e) => e.sequence,
            EngineEvent::Trade(t) => t.sequence,
            EngineEvent::BookUpdate(e) => e.sequence,
            EngineEvent::OrderCancelled(e) => e.sequence,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            EngineEvent::OrderAccepted(e) => &e.symbol,
            EngineEvent::Trade(t) => &t.symbol,
            EngineEvent::BookUpdate(e) => &e.symbol,
            EngineEvent::OrderCancelled(e) => &e.symbol,
        }
    }

    /// Event type label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            EngineEvent::OrderAccepted(_) => "OrderAccepted",
            EngineEvent::Trade(_) => "Trade",
            EngineEvent::BookUpdate(_) => "BookUpdate",
            EngineEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}
