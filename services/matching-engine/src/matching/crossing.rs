//! Crossing detection
//!
//! Determines when an incoming taker may trade at an opposing level.

use types::numeric::Price;
use types::order::Side;

/// Whether a bid and ask price cross (match is possible).
pub fn crosses(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Whether a taker bounded by `limit` may trade at `level_price`.
///
/// `None` means no bound (Market): every level is reachable. For a Buy
/// the walk stops strictly before any level above the limit; for a Sell,
/// strictly before any level below it.
pub fn price_allows(taker_side: Side, limit: Option<Price>, level_price: Price) -> bool {
    match limit {
        None => true,
        Some(limit) => match taker_side {
            Side::Buy => level_price <= limit,
            Side::Sell => level_price >= limit,
        },
    }
}
