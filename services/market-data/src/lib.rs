//! Market Data Fanout
//!
//! Consumes the matching engine's sequenced event stream and produces the
//! three public feeds:
//! - `orderbook`: full snapshot at subscribe time, deltas thereafter
//! - `trades`: public trade prints with fee rates
//! - `bbo`: top-of-book updates, emitted only on change
//!
//! Slow subscribers are dropped (bounded per-subscriber queues), never
//! allowed to block the engine. All prices and quantities travel as
//! decimal strings.
//!
//! ```text
//! SymbolEngine batches
//!        │
//!    ┌───▼────┐
//!    │FeedHub │  mirror · tape · snapshots · bbo tracker
//!    └───┬────┘
//!   ┌────┼─────────┐
//!   │    │         │
//! orderbook trades bbo   (bounded per-subscriber queues)
//! ```

pub mod backpressure;
pub mod bbo;
pub mod events;
pub mod feed;
pub mod mirror;
pub mod snapshot;
pub mod trades;

pub use events::{Channel, FeedMessage};
pub use feed::{spawn_fanout, FanoutHandle, FeedConfig, FeedError, FeedHub, SubscriberId};
pub use mirror::BookMirror;
pub use snapshot::{continues_snapshot, verify_snapshot_integrity, FullSnapshot, SnapshotBuilder};
pub use trades::{TapeEntry, TradeTape};
