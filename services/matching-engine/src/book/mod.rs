//! Order book infrastructure
//!
//! Price levels, the bid and ask halves, and the combined book with the
//! order index.

pub mod ask_book;
pub mod bid_book;
pub mod order_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use order_book::{Bbo, HeadFill, OrderBook};
pub use price_level::PriceLevel;
