//! Property tests over arbitrary command sequences
//!
//! A fresh engine is driven through generated workloads; the universal
//! invariants are checked after every command and once more at the end.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rust_decimal::Decimal;
use std::str::FromStr;

use matching_engine::admission::NewOrder;
use matching_engine::engine::{
    CancelResponse, EngineConfig, OrderResponse, SymbolEngine,
};
use matching_engine::events::EngineEvent;
use matching_engine::replay;
use types::fee::FeeSchedule;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{OrderType, Side};
use types::symbol::SymbolSpec;

#[derive(Debug, Clone)]
enum Cmd {
    New {
        side: Side,
        order_type: OrderType,
        /// Price in ticks of 0.01; ignored for Market.
        price_ticks: i64,
        /// Quantity in lots of 0.001.
        qty_lots: i64,
    },
    /// Cancel the nth order ever submitted (wrapping).
    Cancel { nth: usize },
}

fn any_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn any_order_type() -> impl Strategy<Value = OrderType> {
    prop_oneof![
        3 => Just(OrderType::Limit),
        1 => Just(OrderType::Market),
        1 => Just(OrderType::Ioc),
        1 => Just(OrderType::Fok),
    ]
}

fn any_cmd() -> impl Strategy<Value = Cmd> {
    prop_oneof![
        4 => (any_side(), any_order_type(), 9_900i64..10_100, 1i64..3_000).prop_map(
            |(side, order_type, price_ticks, qty_lots)| Cmd::New {
                side,
                order_type,
                price_ticks,
                qty_lots,
            }
        ),
        1 => (0usize..64).prop_map(|nth| Cmd::Cancel { nth }),
    ]
}

fn spec() -> SymbolSpec {
    SymbolSpec::new(
        Symbol::new("BTC/USD"),
        Decimal::from_str("0.01").unwrap(),
        Decimal::from_str("0.001").unwrap(),
    )
}

fn build_request(side: Side, order_type: OrderType, price_ticks: i64, qty_lots: i64) -> NewOrder {
    let price = match order_type {
        OrderType::Market => None,
        _ => Some(Price::new(Decimal::new(price_ticks, 2))),
    };
    NewOrder {
        client_order_id: None,
        symbol: Symbol::new("BTC/USD"),
        side,
        order_type,
        price,
        quantity: Quantity::new(Decimal::new(qty_lots, 3)),
    }
}

/// Invariant 1: after every command, best bid < best ask.
fn assert_not_crossed(engine: &SymbolEngine) -> Result<(), TestCaseError> {
    let bbo = engine.query(1).bbo;
    if let (Some((bid, _)), Some((ask, _))) = (bbo.best_bid, bbo.best_ask) {
        prop_assert!(bid < ask, "book crossed: bid {} >= ask {}", bid, ask);
    }
    Ok(())
}

/// Invariant 7: every indexed order is live, priced, and sits in a level
/// whose entry matches the record; level totals equal entry sums.
fn assert_index_consistent(engine: &SymbolEngine) -> Result<(), TestCaseError> {
    let book = engine.book();

    for order in book.resting_orders() {
        prop_assert!(!order.remaining_quantity.is_zero());
        prop_assert!(!order.status.is_terminal());
        let price = order.price.expect("resting orders carry a price");

        let levels = book.side_levels(order.side);
        let entry = levels
            .iter()
            .find(|(level_price, _)| *level_price == price)
            .and_then(|(_, entries)| {
                entries.iter().find(|(id, _, _)| *id == order.order_id)
            });
        match entry {
            Some((_, seq, remaining)) => {
                prop_assert_eq!(*seq, order.submission_seq);
                prop_assert_eq!(*remaining, order.remaining_quantity);
            }
            None => prop_assert!(false, "indexed order missing from its level"),
        }
    }

    for side in [Side::Buy, Side::Sell] {
        for (price, entries) in book.side_levels(side) {
            let sum: Decimal = entries.iter().map(|(_, _, q)| q.as_decimal()).sum();
            prop_assert_eq!(
                sum,
                book.level_total(side, price).as_decimal(),
                "level total out of step at {}",
                price
            );

            // FIFO: submission sequences strictly increase within a level
            for window in entries.windows(2) {
                prop_assert!(window[0].1 < window[1].1, "level FIFO broken");
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_invariants_hold(cmds in prop::collection::vec(any_cmd(), 1..120)) {
        let mut engine =
            SymbolEngine::new(spec(), &FeeSchedule::standard(), &EngineConfig::default());
        let mut submitted: Vec<OrderId> = Vec::new();
        let mut journal: Vec<EngineEvent> = Vec::new();
        let mut last_sequence = 0u64;
        let mut sequenced_upto = 0usize;

        for cmd in cmds {
            let before = engine.query(usize::MAX);

            match cmd {
                Cmd::New { side, order_type, price_ticks, qty_lots } => {
                    let request = build_request(side, order_type, price_ticks, qty_lots);
                    let limit = request.price;

                    match engine.new_order(request) {
                        OrderResponse::Accepted(ack) => {
                            submitted.push(ack.order_id);
                            let batch = engine.take_events();

                            // Invariant 2 (conservation): the ack's fills
                            // equal the batch's trade quantities, and
                            // original − remaining equals filled.
                            let traded: Decimal = batch.iter().filter_map(|e| match e {
                                EngineEvent::Trade(t) => Some(t.quantity.as_decimal()),
                                _ => None,
                            }).sum();
                            prop_assert_eq!(ack.filled_quantity.as_decimal(), traded);
                            prop_assert_eq!(
                                ack.filled_quantity.as_decimal()
                                    + ack.remaining_quantity.as_decimal(),
                                Decimal::new(qty_lots, 3)
                            );

                            // Invariants 3 & 4: the walk never worsens
                            // mid-command, and no fill breaches the limit.
                            let mut trade_prices = Vec::new();
                            for event in &batch {
                                if let EngineEvent::Trade(trade) = event {
                                    prop_assert_eq!(trade.aggressor_side, side);
                                    if let Some(limit) = limit {
                                        match side {
                                            Side::Buy => prop_assert!(trade.price <= limit),
                                            Side::Sell => prop_assert!(trade.price >= limit),
                                        }
                                    }
                                    trade_prices.push(trade.price);
                                }
                            }
                            for window in trade_prices.windows(2) {
                                match side {
                                    Side::Buy => prop_assert!(window[0] <= window[1]),
                                    Side::Sell => prop_assert!(window[0] >= window[1]),
                                }
                            }

                            journal.extend(batch);
                        }
                        OrderResponse::Rejected(_) => {
                            // Invariant 5: any reject (FOK feasibility,
                            // admission) leaves the book untouched.
                            prop_assert!(engine.take_events().is_empty());
                            let after = engine.query(usize::MAX);
                            prop_assert_eq!(&before.bids, &after.bids);
                            prop_assert_eq!(&before.asks, &after.asks);
                            prop_assert_eq!(before.last_sequence, after.last_sequence);
                        }
                    }
                }
                Cmd::Cancel { nth } => {
                    if submitted.is_empty() {
                        continue;
                    }
                    let order_id = submitted[nth % submitted.len()];
                    match engine.cancel(order_id) {
                        CancelResponse::Cancelled(_) => {
                            journal.extend(engine.take_events());
                        }
                        CancelResponse::Rejected(_) => {
                            prop_assert!(engine.take_events().is_empty());
                        }
                    }
                }
            }

            assert_not_crossed(&engine)?;
            assert_index_consistent(&engine)?;

            // Invariant 6: sequences strictly increasing and gap-free
            for event in &journal[sequenced_upto..] {
                prop_assert_eq!(event.sequence(), last_sequence + 1, "sequence gap");
                last_sequence = event.sequence();
            }
            sequenced_upto = journal.len();
        }

        // Replay determinism: the journal rebuilds the same book
        let rebuilt = replay::rebuild(
            spec(),
            &FeeSchedule::standard(),
            &EngineConfig::default(),
            &journal,
        ).unwrap();
        let live = engine.query(usize::MAX);
        let replayed = rebuilt.query(usize::MAX);
        prop_assert_eq!(live.bids, replayed.bids);
        prop_assert_eq!(live.asks, replayed.asks);
        prop_assert_eq!(live.last_sequence, replayed.last_sequence);
    }

    #[test]
    fn fok_is_all_or_nothing(
        resting_lots in prop::collection::vec(1i64..1_000, 1..10),
        fok_lots in 1i64..12_000,
    ) {
        let mut engine =
            SymbolEngine::new(spec(), &FeeSchedule::standard(), &EngineConfig::default());

        let mut available = 0i64;
        for lots in &resting_lots {
            available += lots;
            let response = engine.new_order(build_request(
                Side::Sell,
                OrderType::Limit,
                10_000,
                *lots,
            ));
            prop_assert!(matches!(response, OrderResponse::Accepted(_)));
        }
        engine.take_events();

        let response = engine.new_order(build_request(
            Side::Buy,
            OrderType::Fok,
            10_000,
            fok_lots,
        ));

        if fok_lots <= available {
            match response {
                OrderResponse::Accepted(ack) => {
                    prop_assert!(ack.remaining_quantity.is_zero(), "feasible FOK fills fully");
                }
                OrderResponse::Rejected(reason) => {
                    return Err(TestCaseError::fail(format!("feasible FOK rejected: {}", reason)));
                }
            }
        } else {
            prop_assert!(matches!(response, OrderResponse::Rejected(_)));
            // Book byte-identical: full available quantity still resting
            let snapshot = engine.query(usize::MAX);
            prop_assert_eq!(snapshot.asks.len(), 1);
            prop_assert_eq!(snapshot.asks[0].1.as_decimal(), Decimal::new(available, 3));
        }
    }
}
