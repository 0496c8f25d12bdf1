//! Price level with FIFO queue
//!
//! A price level contains all resting orders at a specific price.
//! Orders are maintained in strict FIFO order by submission sequence to
//! enforce time priority. The level is the unit of eviction: it is removed
//! from its side when the last order leaves.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;

/// Entry in the price level queue.
#[derive(Debug, Clone)]
struct LevelEntry {
    order_id: OrderId,
    submission_seq: u64,
    remaining_quantity: Quantity,
}

/// A price level containing orders at a specific price.
///
/// Maintains strict FIFO ordering and an incrementally-updated total
/// quantity (updated on append, remove, and head fill).
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<LevelEntry>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the tail of the queue (newcomers lose priority).
    pub fn append(&mut self, order_id: OrderId, submission_seq: u64, quantity: Quantity) {
        debug_assert!(
            self.orders
                .back()
                .map_or(true, |e| e.submission_seq < submission_seq),
            "level FIFO must be ordered by submission sequence"
        );

        self.orders.push_back(LevelEntry {
            order_id,
            submission_seq,
            remaining_quantity: quantity,
        });
        self.total_quantity = self.total_quantity + quantity;
    }

    /// Peek at the oldest resting order without removing it.
    ///
    /// Returns (order_id, remaining_quantity).
    pub fn peek_front(&self) -> Option<(OrderId, Quantity)> {
        self.orders
            .front()
            .map(|e| (e.order_id, e.remaining_quantity))
    }

    /// Fill the head order by `quantity`, popping it when exhausted.
    ///
    /// Returns true if the head was removed.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the head's
    /// remaining quantity; the matcher sizes fills from `peek_front`.
    pub fn fill_front(&mut self, quantity: Quantity) -> bool {
        let head = self.orders.front_mut().expect("fill_front on empty level");
        assert!(
            quantity.as_decimal() <= head.remaining_quantity.as_decimal(),
            "fill exceeds head remaining quantity"
        );

        head.remaining_quantity = head.remaining_quantity - quantity;
        self.total_quantity = self.total_quantity.saturating_sub(quantity);

        if head.remaining_quantity.is_zero() {
            self.orders.pop_front();
            true
        } else {
            false
        }
    }

    /// Remove an arbitrary order from the queue by id (cancel path).
    ///
    /// Returns the removed order's remaining quantity, or None if absent.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Quantity> {
        let position = self.orders.iter().position(|e| &e.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity);
        Some(entry.remaining_quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total resting quantity at this level.
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders at this level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// FIFO view of (order_id, submission_seq, remaining) for invariant checks.
    pub fn entries(&self) -> impl Iterator<Item = (OrderId, u64, Quantity)> + '_ {
        self.orders
            .iter()
            .map(|e| (e.order_id, e.submission_seq, e.remaining_quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        Quantity::from_str(s).unwrap()
    }

    #[test]
    fn test_append_and_total() {
        let mut level = PriceLevel::new();
        level.append(OrderId::new(), 1, qty("1.5"));
        level.append(OrderId::new(), 2, qty("2.5"));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), qty("4.0"));
        assert!(!level.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        level.append(first, 1, qty("1.0"));
        level.append(OrderId::new(), 2, qty("2.0"));

        let (front_id, front_qty) = level.peek_front().unwrap();
        assert_eq!(front_id, first);
        assert_eq!(front_qty, qty("1.0"));
    }

    #[test]
    fn test_fill_front_partial_keeps_position() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        level.append(first, 1, qty("5.0"));
        level.append(OrderId::new(), 2, qty("1.0"));

        let popped = level.fill_front(qty("3.0"));
        assert!(!popped);

        // Partial fill does not move the head to the tail
        let (front_id, front_qty) = level.peek_front().unwrap();
        assert_eq!(front_id, first);
        assert_eq!(front_qty, qty("2.0"));
        assert_eq!(level.total_quantity(), qty("3.0"));
    }

    #[test]
    fn test_fill_front_exhausted_pops() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();
        level.append(first, 1, qty("1.0"));
        level.append(second, 2, qty("2.0"));

        let popped = level.fill_front(qty("1.0"));
        assert!(popped);
        assert_eq!(level.peek_front().unwrap().0, second);
        assert_eq!(level.total_quantity(), qty("2.0"));
    }

    #[test]
    fn test_remove_arbitrary() {
        let mut level = PriceLevel::new();
        let a = OrderId::new();
        let b = OrderId::new();
        let c = OrderId::new();
        level.append(a, 1, qty("1.0"));
        level.append(b, 2, qty("2.0"));
        level.append(c, 3, qty("3.0"));

        assert_eq!(level.remove(&b), Some(qty("2.0")));
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), qty("4.0"));
        assert_eq!(level.remove(&b), None);

        // FIFO preserved around the removal
        assert_eq!(level.peek_front().unwrap().0, a);
    }

    #[test]
    fn test_drain_to_empty() {
        let mut level = PriceLevel::new();
        level.append(OrderId::new(), 1, qty("1.0"));

        level.fill_front(qty("1.0"));
        assert!(level.is_empty());
        assert!(level.total_quantity().is_zero());
        assert!(level.peek_front().is_none());
    }

    #[test]
    #[should_panic(expected = "fill exceeds head remaining quantity")]
    fn test_overfill_head_panics() {
        let mut level = PriceLevel::new();
        level.append(OrderId::new(), 1, qty("1.0"));
        level.fill_front(qty("2.0"));
    }
}
