//! Depth snapshots
//!
//! Versioned, checksummed full-book snapshots built from the aggregate
//! mirror. A new subscriber receives one atomically with its sequence
//! position, after which deltas apply; the snapshot/delta continuity
//! check guards the no-missed-delta window.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::ids::Symbol;
use types::numeric::{Price, Quantity};

use crate::events::FeedMessage;
use crate::mirror::BookMirror;

/// A versioned, checksummed snapshot of the full order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullSnapshot {
    /// Monotonic snapshot version.
    pub version: u64,
    pub symbol: Symbol,
    /// Bid levels in descending price order (best first).
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels in ascending price order (best first).
    pub asks: Vec<(Price, Quantity)>,
    /// Last event sequence included in this snapshot.
    pub last_sequence: u64,
    pub timestamp: i64,
    /// SHA-256 over levels and sequence, for integrity checks.
    pub checksum: String,
}

impl FullSnapshot {
    /// Render as an `orderbook` channel message (full book).
    pub fn to_feed_message(&self) -> FeedMessage {
        FeedMessage::OrderbookUpdate {
            symbol: self.symbol.clone(),
            bids: self.bids.clone(),
            asks: self.asks.clone(),
            timestamp: self.timestamp,
            seq: self.last_sequence,
        }
    }
}

/// Builds versioned snapshots from the mirror.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version_counter: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, mirror: &BookMirror, timestamp: i64) -> FullSnapshot {
        self.version_counter += 1;

        let bids = mirror.bid_levels();
        let asks = mirror.ask_levels();
        let last_sequence = mirror.last_sequence();
        let checksum = compute_checksum(&bids, &asks, last_sequence);

        FullSnapshot {
            version: self.version_counter,
            symbol: mirror.symbol.clone(),
            bids,
            asks,
            last_sequence,
            timestamp,
            checksum,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.version_counter
    }
}

/// SHA-256 over the level lists and the sequence number.
fn compute_checksum(
    bids: &[(Price, Quantity)],
    asks: &[(Price, Quantity)],
    sequence: u64,
) -> String {
    let mut hasher = Sha256::new();

    for (price, quantity) in bids {
        hasher.update(price.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(quantity.to_string().as_bytes());
        hasher.update(b"|");
    }
    hasher.update(b"---");

    for (price, quantity) in asks {
        hasher.update(price.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(quantity.to_string().as_bytes());
        hasher.update(b"|");
    }
    hasher.update(b"---");

    hasher.update(sequence.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify that a snapshot's checksum matches its content.
pub fn verify_snapshot_integrity(snapshot: &FullSnapshot) -> bool {
    let expected = compute_checksum(&snapshot.bids, &snapshot.asks, snapshot.last_sequence);
    snapshot.checksum == expected
}

/// A delta stream continues a snapshot iff its first message is sequenced
/// after the snapshot.
pub fn continues_snapshot(snapshot: &FullSnapshot, first_delta_sequence: u64) -> bool {
    snapshot.last_sequence < first_delta_sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use matching_engine::events::{BookUpdate, LevelChange};
    use types::order::Side;

    fn populated_mirror() -> BookMirror {
        let mut mirror = BookMirror::new(Symbol::new("BTC/USD"));
        let mut changes = Vec::new();
        for i in 1..=5u32 {
            changes.push(LevelChange {
                side: Side::Buy,
                price: Price::from_str(&format!("{}.00", 100 - i)).unwrap(),
                new_total_quantity: Quantity::from_str("1.0").unwrap(),
            });
            changes.push(LevelChange {
                side: Side::Sell,
                price: Price::from_str(&format!("{}.00", 100 + i)).unwrap(),
                new_total_quantity: Quantity::from_str("1.0").unwrap(),
            });
        }
        mirror.apply(&BookUpdate {
            symbol: Symbol::new("BTC/USD"),
            sequence: 10,
            timestamp: 1_000,
            changes,
        });
        mirror
    }

    #[test]
    fn test_build_snapshot() {
        let mirror = populated_mirror();
        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&mirror, 2_000);

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.bids.len(), 5);
        assert_eq!(snapshot.asks.len(), 5);
        assert_eq!(snapshot.last_sequence, 10);
        assert!(!snapshot.checksum.is_empty());

        // Best-first ordering
        assert_eq!(snapshot.bids[0].0, Price::from_str("99.00").unwrap());
        assert_eq!(snapshot.asks[0].0, Price::from_str("101.00").unwrap());
    }

    #[test]
    fn test_versions_increment() {
        let mirror = populated_mirror();
        let mut builder = SnapshotBuilder::new();

        assert_eq!(builder.build(&mirror, 1_000).version, 1);
        assert_eq!(builder.build(&mirror, 2_000).version, 2);
        assert_eq!(builder.current_version(), 2);
    }

    #[test]
    fn test_integrity_detects_tampering() {
        let mirror = populated_mirror();
        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&mirror, 1_000);

        assert!(verify_snapshot_integrity(&snapshot));

        let mut tampered = snapshot.clone();
        tampered.checksum = "corrupted".to_string();
        assert!(!verify_snapshot_integrity(&tampered));

        let mut resequenced = snapshot;
        resequenced.last_sequence += 1;
        assert!(!verify_snapshot_integrity(&resequenced));
    }

    #[test]
    fn test_checksum_deterministic() {
        let mirror = populated_mirror();
        let a = SnapshotBuilder::new().build(&mirror, 1_000);
        let b = SnapshotBuilder::new().build(&mirror, 1_000);
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn test_delta_continuity() {
        let mirror = populated_mirror();
        let snapshot = SnapshotBuilder::new().build(&mirror, 1_000);

        assert!(continues_snapshot(&snapshot, 11));
        assert!(!continues_snapshot(&snapshot, 10));
        assert!(!continues_snapshot(&snapshot, 5));
    }

    #[test]
    fn test_feed_message_rendering() {
        let mirror = populated_mirror();
        let snapshot = SnapshotBuilder::new().build(&mirror, 1_000);
        let message = snapshot.to_feed_message();

        match message {
            FeedMessage::OrderbookUpdate { bids, asks, seq, .. } => {
                assert_eq!(bids.len(), 5);
                assert_eq!(asks.len(), 5);
                assert_eq!(seq, 10);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
}
