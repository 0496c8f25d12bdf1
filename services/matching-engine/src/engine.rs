//! Single-writer symbol engine
//!
//! One engine owns one (book, index, matcher, sequencer) and processes
//! commands in strict arrival order. The core (`SymbolEngine`) is a plain
//! synchronous state machine; `spawn` runs it on a dedicated thread behind
//! a bounded inbox. A full inbox rejects with `Backpressure` on the
//! submitting side without blocking.
//!
//! The matcher is non-suspending: once a command starts it runs to
//! completion (bounded work: at most one full book walk). Each command's
//! event batch is forwarded to the fanout channel as one message, so no
//! subscriber observes a partial batch.

use std::collections::{HashSet, VecDeque};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use types::errors::{EngineError, RejectReason};
use types::fee::FeeSchedule;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{CancelReason, Order, OrderStatus};
use types::symbol::SymbolSpec;

use crate::admission::{admit, NewOrder, SymbolRegistry};
use crate::book::{Bbo, OrderBook};
use crate::events::{BookUpdate, EngineEvent, OrderAccepted, OrderCancelled};
use crate::matching::Matcher;
use crate::sequencer::Sequencer;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded inbox capacity; a full inbox rejects with Backpressure.
    pub inbox_capacity: usize,
    /// How many terminated order ids to remember for AlreadyTerminal.
    pub terminal_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 1024,
            terminal_window: 65_536,
        }
    }
}

/// Monotonic engine-local clock.
///
/// Timestamps are nanoseconds since engine start, never wall clock;
/// sequence numbers, not timestamps, are the ordering authority.
#[derive(Debug, Clone)]
struct EngineClock {
    origin: Instant,
}

impl EngineClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    fn now(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Bounded memory of terminated order ids.
///
/// Distinguishes `AlreadyTerminal` from `UnknownOrder` on cancel. Oldest
/// ids are evicted first once the window is full.
#[derive(Debug, Clone)]
struct TerminalWindow {
    seen: HashSet<OrderId>,
    order: VecDeque<OrderId>,
    capacity: usize,
}

impl TerminalWindow {
    fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn record(&mut self, order_id: OrderId) {
        if !self.seen.insert(order_id) {
            return;
        }
        self.order.push_back(order_id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }

    fn contains(&self, order_id: &OrderId) -> bool {
        self.seen.contains(order_id)
    }
}

/// Successful new-order ack with the engine's sequence position.
#[derive(Debug, Clone, Serialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub client_order_id: Option<String>,
    pub accepted_seq: u64,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// Volume-weighted average fill price when fills occurred.
    pub avg_fill_price: Option<Decimal>,
}

/// Successful cancel ack.
#[derive(Debug, Clone, Serialize)]
pub struct CancelAck {
    pub order_id: OrderId,
    pub cancelled_seq: u64,
    pub cancelled_quantity: Quantity,
}

/// New-order response: accepted (possibly terminal) or rejected.
#[derive(Debug, Clone, Serialize)]
pub enum OrderResponse {
    Accepted(OrderAck),
    Rejected(RejectReason),
}

/// Cancel response.
#[derive(Debug, Clone, Serialize)]
pub enum CancelResponse {
    Cancelled(CancelAck),
    Rejected(RejectReason),
}

/// Immutable book snapshot for queries.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    /// Top-N bid levels, best first.
    pub bids: Vec<(Price, Quantity)>,
    /// Top-N ask levels, best first.
    pub asks: Vec<(Price, Quantity)>,
    pub bbo: Bbo,
    pub last_sequence: u64,
    pub timestamp: i64,
}

/// Engine health counters.
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub symbol: Symbol,
    pub orders_processed: u64,
    pub trades_executed: u64,
    pub total_volume: Decimal,
    pub resting_orders: usize,
    pub last_sequence: u64,
    pub uptime_nanos: i64,
}

/// The single-writer core: owns one book and all its counters.
pub struct SymbolEngine {
    spec: SymbolSpec,
    registry: SymbolRegistry,
    book: OrderBook,
    matcher: Matcher,
    sequencer: Sequencer,
    clock: EngineClock,
    next_submission_seq: u64,
    terminal: TerminalWindow,
    inbox_capacity: usize,
    /// Event batch of the command being processed.
    outbox: Vec<EngineEvent>,
    orders_processed: u64,
    trades_executed: u64,
    total_volume: Decimal,
}

impl SymbolEngine {
    pub fn new(spec: SymbolSpec, fee_schedule: &FeeSchedule, config: &EngineConfig) -> Self {
        let mut registry = SymbolRegistry::new();
        registry.register(spec.clone());

        info!(symbol = %spec.symbol, "symbol engine created");

        Self {
            matcher: Matcher::new(spec.symbol.clone(), fee_schedule),
            registry,
            spec,
            book: OrderBook::new(),
            sequencer: Sequencer::new(),
            clock: EngineClock::new(),
            next_submission_seq: 1,
            terminal: TerminalWindow::new(config.terminal_window),
            inbox_capacity: config.inbox_capacity,
            outbox: Vec::new(),
            orders_processed: 0,
            trades_executed: 0,
            total_volume: Decimal::ZERO,
        }
    }

    /// Rebuild an engine from replayed state (see `replay`).
    pub(crate) fn with_state(
        spec: SymbolSpec,
        fee_schedule: &FeeSchedule,
        config: &EngineConfig,
        book: OrderBook,
        sequencer: Sequencer,
        next_submission_seq: u64,
    ) -> Self {
        let mut engine = Self::new(spec, fee_schedule, config);
        engine.book = book;
        engine.sequencer = sequencer;
        engine.next_submission_seq = next_submission_seq;
        // Replay repopulated levels; those touches are not a new delta.
        engine.book.take_level_changes();
        engine
    }

    pub fn symbol(&self) -> &Symbol {
        &self.spec.symbol
    }

    /// Admit, match, and ack one new order.
    pub fn new_order(&mut self, request: NewOrder) -> OrderResponse {
        if let Err(reason) = admit(&self.registry, &request) {
            debug!(symbol = %self.spec.symbol, %reason, "order rejected at admission");
            return OrderResponse::Rejected(reason);
        }

        let timestamp = self.clock.now();
        let submission_seq = self.next_submission_seq;
        self.next_submission_seq += 1;

        let mut order = Order::new(
            request.client_order_id,
            request.symbol,
            request.side,
            request.order_type,
            request.price,
            request.quantity,
            submission_seq,
            timestamp,
        );

        let outcome = self
            .matcher
            .apply(&mut self.book, &mut self.sequencer, &mut order, timestamp);

        assert!(
            !self.book.is_crossed(),
            "book crossed after matching {}",
            order.order_id
        );

        self.orders_processed += 1;
        self.trades_executed += outcome.trades.len() as u64;

        let avg_fill_price = average_fill_price(&outcome.trades);
        for trade in &outcome.trades {
            self.total_volume += trade.quantity.as_decimal();
            // Makers the walk exhausted are gone from the index.
            if self.book.get_order(&trade.maker_order_id).is_none() {
                self.terminal.record(trade.maker_order_id);
            }
        }

        if let OrderStatus::Rejected(reason) = &order.status {
            debug_assert!(outcome.trades.is_empty(), "rejects must not trade");
            return OrderResponse::Rejected(reason.clone());
        }

        for trade in outcome.trades {
            self.outbox.push(EngineEvent::Trade(trade));
        }

        if outcome.rested {
            let price = order.price.expect("resting order carries a price");
            self.outbox.push(EngineEvent::OrderAccepted(OrderAccepted {
                symbol: self.spec.symbol.clone(),
                sequence: self.sequencer.next_sequence(),
                timestamp,
                order_id: order.order_id,
                side: order.side,
                price,
                quantity: order.remaining_quantity,
                submission_seq: order.submission_seq,
            }));
        } else if order.status.is_terminal() {
            self.terminal.record(order.order_id);
        }

        self.emit_book_update(timestamp);

        debug!(
            symbol = %self.spec.symbol,
            order_id = %order.order_id,
            status = ?order.status,
            accepted_seq = self.sequencer.last_sequence(),
            "order processed"
        );

        OrderResponse::Accepted(OrderAck {
            order_id: order.order_id,
            client_order_id: order.client_order_id.clone(),
            accepted_seq: self.sequencer.last_sequence(),
            status: order.status,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity,
            avg_fill_price,
        })
    }

    /// Cancel a resting order.
    pub fn cancel(&mut self, order_id: OrderId) -> CancelResponse {
        let timestamp = self.clock.now();

        let Some(mut order) = self.book.remove_resting(&order_id) else {
            return if self.terminal.contains(&order_id) {
                CancelResponse::Rejected(RejectReason::AlreadyTerminal(order_id.to_string()))
            } else {
                CancelResponse::Rejected(RejectReason::UnknownOrder(order_id.to_string()))
            };
        };

        order.cancel(CancelReason::UserRequested, timestamp);
        self.terminal.record(order_id);

        let price = order.price.expect("resting order carries a price");
        self.outbox.push(EngineEvent::OrderCancelled(OrderCancelled {
            symbol: self.spec.symbol.clone(),
            sequence: self.sequencer.next_sequence(),
            timestamp,
            order_id,
            side: order.side,
            price,
            cancelled_quantity: order.remaining_quantity,
            reason: CancelReason::UserRequested,
        }));
        self.emit_book_update(timestamp);

        debug!(symbol = %self.spec.symbol, %order_id, "order cancelled");

        CancelResponse::Cancelled(CancelAck {
            order_id,
            cancelled_seq: self.sequencer.last_sequence(),
            cancelled_quantity: order.remaining_quantity,
        })
    }

    /// Immutable snapshot of the top `depth` levels per side.
    pub fn query(&self, depth: usize) -> BookSnapshot {
        let (bids, asks) = self.book.depth(depth);
        BookSnapshot {
            symbol: self.spec.symbol.clone(),
            bids,
            asks,
            bbo: self.book.bbo(),
            last_sequence: self.sequencer.last_sequence(),
            timestamp: self.clock.now(),
        }
    }

    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            symbol: self.spec.symbol.clone(),
            orders_processed: self.orders_processed,
            trades_executed: self.trades_executed,
            total_volume: self.total_volume,
            resting_orders: self.book.resting_count(),
            last_sequence: self.sequencer.last_sequence(),
            uptime_nanos: self.clock.now(),
        }
    }

    /// Take the event batch produced by the last command.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Direct book access for invariant checks in tests.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    fn emit_book_update(&mut self, timestamp: i64) {
        let changes = self.book.take_level_changes();
        if changes.is_empty() {
            return;
        }
        self.outbox.push(EngineEvent::BookUpdate(BookUpdate {
            symbol: self.spec.symbol.clone(),
            sequence: self.sequencer.next_sequence(),
            timestamp,
            changes,
        }));
    }
}

fn average_fill_price(trades: &[types::trade::Trade]) -> Option<Decimal> {
    if trades.is_empty() {
        return None;
    }
    let mut notional = Decimal::ZERO;
    let mut filled = Decimal::ZERO;
    for trade in trades {
        notional += trade.value();
        filled += trade.quantity.as_decimal();
    }
    Some(notional / filled)
}

/// Commands accepted by the engine thread.
enum Command {
    NewOrder {
        request: NewOrder,
        reply: oneshot::Sender<OrderResponse>,
    },
    Cancel {
        order_id: OrderId,
        reply: oneshot::Sender<CancelResponse>,
    },
    Query {
        depth: usize,
        reply: oneshot::Sender<BookSnapshot>,
    },
    Health {
        reply: oneshot::Sender<EngineHealth>,
    },
    Shutdown,
}

/// Cloneable submission handle to a running engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    symbol: Symbol,
    inbox: Sender<Command>,
}

impl EngineHandle {
    /// Submit a new order; a full inbox rejects with Backpressure
    /// without blocking.
    pub fn submit_order(&self, request: NewOrder) -> Result<OrderResponse, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        match self.inbox.try_send(Command::NewOrder {
            request,
            reply: reply_tx,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                return Ok(OrderResponse::Rejected(RejectReason::Backpressure));
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(EngineError::EngineStopped(self.symbol.as_str().to_string()));
            }
        }
        reply_rx.recv().map_err(|_| EngineError::ReplyDropped)
    }

    /// Cancel a resting order.
    pub fn cancel(&self, order_id: OrderId) -> Result<CancelResponse, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        match self.inbox.try_send(Command::Cancel {
            order_id,
            reply: reply_tx,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                return Ok(CancelResponse::Rejected(RejectReason::Backpressure));
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(EngineError::EngineStopped(self.symbol.as_str().to_string()));
            }
        }
        reply_rx.recv().map_err(|_| EngineError::ReplyDropped)
    }

    /// Snapshot the top `depth` levels per side.
    pub fn query(&self, depth: usize) -> Result<BookSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbox
            .send(Command::Query {
                depth,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::EngineStopped(self.symbol.as_str().to_string()))?;
        reply_rx.recv().map_err(|_| EngineError::ReplyDropped)
    }

    /// Engine health counters.
    pub fn health(&self) -> Result<EngineHealth, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbox
            .send(Command::Health { reply: reply_tx })
            .map_err(|_| EngineError::EngineStopped(self.symbol.as_str().to_string()))?;
        reply_rx.recv().map_err(|_| EngineError::ReplyDropped)
    }

    /// Ask the engine thread to stop after the commands already queued.
    pub fn shutdown(&self) {
        let _ = self.inbox.send(Command::Shutdown);
    }
}

/// Spawn an engine on a dedicated thread.
///
/// Returns the submission handle, the sequenced event stream (one message
/// per command batch), and the thread handle. The inbox capacity comes
/// from the engine's config.
pub fn spawn(
    mut engine: SymbolEngine,
) -> (EngineHandle, Receiver<Vec<EngineEvent>>, JoinHandle<()>) {
    let (inbox_tx, inbox_rx) = bounded::<Command>(engine.inbox_capacity);
    let (events_tx, events_rx) = unbounded::<Vec<EngineEvent>>();
    let symbol = engine.symbol().clone();
    let thread_symbol = symbol.clone();

    let join = thread::Builder::new()
        .name(format!("engine-{}", symbol.as_str().replace('/', "-")))
        .spawn(move || {
            info!(symbol = %thread_symbol, "engine thread started");
            run(&mut engine, inbox_rx, events_tx);
            info!(symbol = %thread_symbol, "engine thread stopped");
        })
        .expect("spawn engine thread");

    (
        EngineHandle {
            symbol,
            inbox: inbox_tx,
        },
        events_rx,
        join,
    )
}

fn run(engine: &mut SymbolEngine, inbox: Receiver<Command>, events: Sender<Vec<EngineEvent>>) {
    // Blocks only here; command execution never suspends.
    while let Ok(command) = inbox.recv() {
        match command {
            Command::NewOrder { request, reply } => {
                let response = engine.new_order(request);
                forward_events(engine, &events);
                let _ = reply.send(response);
            }
            Command::Cancel { order_id, reply } => {
                let response = engine.cancel(order_id);
                forward_events(engine, &events);
                let _ = reply.send(response);
            }
            Command::Query { depth, reply } => {
                let _ = reply.send(engine.query(depth));
            }
            Command::Health { reply } => {
                let _ = reply.send(engine.health());
            }
            Command::Shutdown => break,
        }
    }
}

fn forward_events(engine: &mut SymbolEngine, events: &Sender<Vec<EngineEvent>>) {
    let batch = engine.take_events();
    if batch.is_empty() {
        return;
    }
    if events.send(batch).is_err() {
        // Fanout is gone; matching continues, events are dropped.
        warn!(symbol = %engine.symbol(), "event stream receiver dropped");
    }
}
