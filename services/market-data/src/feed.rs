//! Feed hub and fanout service
//!
//! Consumes the engine's per-command event batches and fans them out to
//! the three public channels. Each subscriber owns a bounded queue;
//! overflow closes the subscriber rather than ever blocking the hub. A
//! new `orderbook` subscriber receives a full snapshot in the same hub
//! step that registers it, so no delta can fall between its snapshot and
//! its stream.

use std::collections::BTreeMap;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

use matching_engine::events::EngineEvent;
use types::ids::Symbol;

use crate::backpressure::{QueueError, SubscriberQueue};
use crate::bbo::BboTracker;
use crate::events::{Channel, FeedMessage};
use crate::mirror::BookMirror;
use crate::snapshot::SnapshotBuilder;
use crate::trades::TradeTape;

pub type SubscriberId = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("subscriber {0} was dropped after queue overflow")]
    SubscriberDropped(SubscriberId),

    #[error("unknown subscriber {0}")]
    UnknownSubscriber(SubscriberId),

    #[error("fanout service has stopped")]
    ServiceStopped,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Per-subscriber queue capacity; overflow closes the subscriber.
    pub queue_capacity: usize,
    /// Bounded trade tape length.
    pub tape_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            tape_capacity: 1000,
        }
    }
}

struct Subscriber {
    channel: Channel,
    queue: SubscriberQueue,
}

/// Single-threaded fanout state for one symbol.
pub struct FeedHub {
    symbol: Symbol,
    mirror: BookMirror,
    bbo: BboTracker,
    snapshots: SnapshotBuilder,
    tape: TradeTape,
    subscribers: BTreeMap<SubscriberId, Subscriber>,
    next_subscriber_id: SubscriberId,
    config: FeedConfig,
    /// Timestamp of the last event seen, used to stamp snapshots.
    last_timestamp: i64,
    subscribers_dropped: u64,
}

impl FeedHub {
    pub fn new(symbol: Symbol, config: FeedConfig) -> Self {
        Self {
            mirror: BookMirror::new(symbol.clone()),
            bbo: BboTracker::new(),
            snapshots: SnapshotBuilder::new(),
            tape: TradeTape::new(symbol.clone(), config.tape_capacity),
            subscribers: BTreeMap::new(),
            next_subscriber_id: 1,
            config,
            last_timestamp: 0,
            subscribers_dropped: 0,
            symbol,
        }
    }

    /// Register a subscriber on a channel.
    ///
    /// An `orderbook` subscriber is seeded with a full snapshot carrying
    /// the current sequence position before any further delta reaches it.
    pub fn subscribe(&mut self, channel: Channel) -> SubscriberId {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;

        let mut queue = SubscriberQueue::new(self.config.queue_capacity);
        if channel == Channel::Orderbook {
            let snapshot = self.snapshots.build(&self.mirror, self.last_timestamp);
            let message = serialize(&snapshot.to_feed_message());
            // A fresh queue has room for one snapshot.
            queue.enqueue(message).expect("fresh queue accepts snapshot");
        }

        self.subscribers.insert(id, Subscriber { channel, queue });
        debug!(symbol = %self.symbol, id, channel = channel.as_str(), "subscriber added");
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.remove(&id);
        debug!(symbol = %self.symbol, id, "subscriber removed");
    }

    /// Apply one engine command batch atomically.
    ///
    /// Trades and book deltas fan out in event order; a BBO update is
    /// derived once per batch after the mirror settles.
    pub fn apply_batch(&mut self, batch: &[EngineEvent]) {
        let mut bbo_cause: Option<(u64, i64)> = None;

        for event in batch {
            match event {
                EngineEvent::Trade(trade) => {
                    self.tape.record(trade);
                    self.last_timestamp = trade.timestamp;
                    self.broadcast(Channel::Trades, &FeedMessage::from_trade(trade));
                }
                EngineEvent::BookUpdate(update) => {
                    self.mirror.apply(update);
                    self.last_timestamp = update.timestamp;
                    bbo_cause = Some((update.sequence, update.timestamp));
                    self.broadcast(Channel::Orderbook, &FeedMessage::from_book_update(update));
                }
                // Journal-only events; the aggregate feed derives nothing
                // further from them.
                EngineEvent::OrderAccepted(accepted) => {
                    self.last_timestamp = accepted.timestamp;
                }
                EngineEvent::OrderCancelled(cancelled) => {
                    self.last_timestamp = cancelled.timestamp;
                }
            }
        }

        if let Some((seq, timestamp)) = bbo_cause {
            if let Some(message) = self.bbo.observe(&self.mirror, seq, timestamp) {
                self.broadcast(Channel::Bbo, &message);
            }
        }
    }

    /// Drain a subscriber's queued messages.
    ///
    /// A subscriber closed by overflow is reported once, then forgotten.
    pub fn drain(&mut self, id: SubscriberId) -> Result<Vec<String>, FeedError> {
        let subscriber = self
            .subscribers
            .get_mut(&id)
            .ok_or(FeedError::UnknownSubscriber(id))?;

        if subscriber.queue.is_closed() {
            self.subscribers.remove(&id);
            return Err(FeedError::SubscriberDropped(id));
        }
        Ok(subscriber.queue.drain())
    }

    /// Recent trades from the tape, newest first.
    pub fn recent_trades(&self, limit: usize) -> Vec<crate::trades::TapeEntry> {
        self.tape.recent(limit)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribers_dropped(&self) -> u64 {
        self.subscribers_dropped
    }

    pub fn mirror(&self) -> &BookMirror {
        &self.mirror
    }

    fn broadcast(&mut self, channel: Channel, message: &FeedMessage) {
        let payload = serialize(message);

        let mut overflowed = Vec::new();
        for (id, subscriber) in self.subscribers.iter_mut() {
            if subscriber.channel != channel {
                continue;
            }
            match subscriber.queue.enqueue(payload.clone()) {
                Ok(()) => {}
                Err(QueueError::Overflow) => overflowed.push(*id),
                // Already closed; awaiting its final drain.
                Err(QueueError::Closed) => {}
            }
        }

        for id in overflowed {
            self.subscribers_dropped += 1;
            warn!(
                symbol = %self.symbol,
                id,
                channel = channel.as_str(),
                "dropping lagging subscriber"
            );
        }
    }
}

fn serialize(message: &FeedMessage) -> String {
    serde_json::to_string(message).expect("feed messages serialize")
}

/// Control requests for a running fanout thread.
enum HubRequest {
    Subscribe {
        channel: Channel,
        reply: oneshot::Sender<SubscriberId>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    Drain {
        id: SubscriberId,
        reply: oneshot::Sender<Result<Vec<String>, FeedError>>,
    },
}

/// Cloneable handle to a running fanout thread.
#[derive(Clone)]
pub struct FanoutHandle {
    control: Sender<HubRequest>,
}

impl FanoutHandle {
    pub fn subscribe(&self, channel: Channel) -> Result<SubscriberId, FeedError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control
            .send(HubRequest::Subscribe {
                channel,
                reply: reply_tx,
            })
            .map_err(|_| FeedError::ServiceStopped)?;
        reply_rx.recv().map_err(|_| FeedError::ServiceStopped)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> Result<(), FeedError> {
        self.control
            .send(HubRequest::Unsubscribe { id })
            .map_err(|_| FeedError::ServiceStopped)
    }

    pub fn drain(&self, id: SubscriberId) -> Result<Vec<String>, FeedError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control
            .send(HubRequest::Drain { id, reply: reply_tx })
            .map_err(|_| FeedError::ServiceStopped)?;
        reply_rx.recv().map_err(|_| FeedError::ServiceStopped)?
    }
}

/// Run a hub on its own thread, consuming the engine's event stream.
///
/// The service stops when the engine side of the event channel closes.
pub fn spawn_fanout(
    mut hub: FeedHub,
    events: Receiver<Vec<EngineEvent>>,
) -> (FanoutHandle, JoinHandle<()>) {
    let (control_tx, control_rx) = unbounded::<HubRequest>();

    let join = thread::Builder::new()
        .name(format!("fanout-{}", hub.symbol.as_str().replace('/', "-")))
        .spawn(move || {
            info!(symbol = %hub.symbol, "fanout thread started");
            loop {
                crossbeam_channel::select! {
                    recv(events) -> batch => match batch {
                        Ok(batch) => hub.apply_batch(&batch),
                        Err(_) => break,
                    },
                    recv(control_rx) -> request => match request {
                        Ok(HubRequest::Subscribe { channel, reply }) => {
                            let _ = reply.send(hub.subscribe(channel));
                        }
                        Ok(HubRequest::Unsubscribe { id }) => hub.unsubscribe(id),
                        Ok(HubRequest::Drain { id, reply }) => {
                            let _ = reply.send(hub.drain(id));
                        }
                        Err(_) => break,
                    },
                }
            }
            info!(symbol = %hub.symbol, "fanout thread stopped");
        })
        .expect("spawn fanout thread");

    (FanoutHandle { control: control_tx }, join)
}
