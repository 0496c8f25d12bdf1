//! Top-of-book tracker
//!
//! Derives the BBO from the aggregate mirror after each book update and
//! emits a `bbo_update` only when the top of either side actually
//! changed.

use rust_decimal::Decimal;
use types::numeric::{Price, Quantity};

use crate::events::FeedMessage;
use crate::mirror::BookMirror;

/// Last published top-of-book view.
#[derive(Debug, Clone, PartialEq)]
struct TopOfBook {
    best_bid: Option<(Price, Quantity)>,
    best_ask: Option<(Price, Quantity)>,
}

/// Emits BBO updates on change only.
#[derive(Debug, Default)]
pub struct BboTracker {
    last_published: Option<TopOfBook>,
}

impl BboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the mirror's current top against the last published one;
    /// emit an update if it moved. `seq`/`timestamp` come from the book
    /// update that caused the change.
    pub fn observe(
        &mut self,
        mirror: &BookMirror,
        seq: u64,
        timestamp: i64,
    ) -> Option<FeedMessage> {
        let current = TopOfBook {
            best_bid: mirror.best_bid(),
            best_ask: mirror.best_ask(),
        };

        if self.last_published.as_ref() == Some(&current) {
            return None;
        }

        let spread = match (&current.best_bid, &current.best_ask) {
            (Some((bid, _)), Some((ask, _))) => {
                Some(ask.as_decimal() - bid.as_decimal())
            }
            _ => None::<Decimal>,
        };

        let message = FeedMessage::BboUpdate {
            symbol: mirror.symbol.clone(),
            best_bid: current.best_bid.map(|(p, _)| p),
            best_bid_qty: current.best_bid.map(|(_, q)| q),
            best_ask: current.best_ask.map(|(p, _)| p),
            best_ask_qty: current.best_ask.map(|(_, q)| q),
            spread,
            timestamp,
            seq,
        };
        self.last_published = Some(current);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matching_engine::events::{BookUpdate, LevelChange};
    use types::ids::Symbol;
    use types::order::Side;

    fn px(s: &str) -> Price {
        Price::from_str(s).unwrap()
    }

    fn apply(mirror: &mut BookMirror, seq: u64, side: Side, price: &str, quantity: &str) {
        let quantity = Quantity::try_new(Decimal::from_str_exact(quantity).unwrap())
            .unwrap_or_else(Quantity::zero);
        mirror.apply(&BookUpdate {
            symbol: Symbol::new("BTC/USD"),
            sequence: seq,
            timestamp: seq as i64 * 1_000,
            changes: vec![LevelChange {
                side,
                price: px(price),
                new_total_quantity: quantity,
            }],
        });
    }

    #[test]
    fn test_emits_on_first_observation() {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut tracker = BboTracker::new();

        apply(&mut mirror, 1, Side::Buy, "99.00", "1.0");
        let message = tracker.observe(&mirror, 1, 1_000).unwrap();

        match message {
            FeedMessage::BboUpdate {
                best_bid,
                best_ask,
                spread,
                ..
            } => {
                assert_eq!(best_bid, Some(px("99.00")));
                assert_eq!(best_ask, None);
                assert_eq!(spread, None);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_silent_when_top_unchanged() {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut tracker = BboTracker::new();

        apply(&mut mirror, 1, Side::Buy, "99.00", "1.0");
        assert!(tracker.observe(&mirror, 1, 1_000).is_some());

        // Deeper level appears; top of book unchanged
        apply(&mut mirror, 2, Side::Buy, "98.00", "5.0");
        assert!(tracker.observe(&mirror, 2, 2_000).is_none());
    }

    #[test]
    fn test_emits_spread_when_both_sides_set() {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut tracker = BboTracker::new();

        apply(&mut mirror, 1, Side::Buy, "99.00", "1.0");
        apply(&mut mirror, 2, Side::Sell, "101.00", "2.0");
        let message = tracker.observe(&mirror, 2, 2_000).unwrap();

        match message {
            FeedMessage::BboUpdate { spread, .. } => {
                assert_eq!(spread, Some(Decimal::from(2)));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_emits_on_quantity_change_at_same_price() {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut tracker = BboTracker::new();

        apply(&mut mirror, 1, Side::Buy, "99.00", "1.0");
        tracker.observe(&mirror, 1, 1_000);

        apply(&mut mirror, 2, Side::Buy, "99.00", "3.0");
        let message = tracker.observe(&mirror, 2, 2_000);
        assert!(message.is_some(), "top quantity change is a BBO change");
    }

    #[test]
    fn test_emits_when_book_empties() {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut tracker = BboTracker::new();

        apply(&mut mirror, 1, Side::Buy, "99.00", "1.0");
        tracker.observe(&mirror, 1, 1_000);

        apply(&mut mirror, 2, Side::Buy, "99.00", "0");
        let message = tracker.observe(&mirror, 2, 2_000).unwrap();
        match message {
            FeedMessage::BboUpdate { best_bid, .. } => assert_eq!(best_bid, None),
            other => panic!("unexpected message {:?}", other),
        }
    }
}
