//! Matching Engine
//!
//! Central limit order book matching with strict price-time priority for
//! the four supported order types (Market, Limit, IOC, FOK).
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; FIFO within a level
//! - Every trade prints at the maker's resting price (no trade-through)
//! - Deterministic: same command order → same trades, same events
//! - The book is never crossed after a command completes
//! - Per-symbol event sequences are strictly increasing and gap-free
//!
//! One single-writer engine per symbol; scale-out is by sharding symbols
//! across engine threads, never by parallelizing one book.

pub mod admission;
pub mod book;
pub mod engine;
pub mod events;
pub mod matching;
pub mod replay;
pub mod sequencer;

pub use admission::{NewOrder, SymbolRegistry};
pub use engine::{
    spawn, BookSnapshot, CancelAck, CancelResponse, EngineConfig, EngineHandle, EngineHealth,
    OrderAck, OrderResponse, SymbolEngine,
};
pub use events::EngineEvent;
