//! Order lifecycle types
//!
//! Side, order type, the monotonic status machine, and the `Order`
//! record mutated exclusively by its symbol's matcher.

use crate::errors::RejectReason;
use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// The four supported order types.
///
/// IOC and FOK share the limit walk; they differ only in residual
/// handling and the FOK pre-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
    Ioc,
    Fok,
}

impl OrderType {
    /// Market orders must not carry a price; everything else must.
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }

    /// Only plain Limit orders may rest on the book.
    pub fn may_rest(&self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

/// Why an order (or its residual) was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Explicit Cancel command from the submitter.
    UserRequested,
    /// IOC residual after the walk.
    IocResidual,
    /// Market order met an empty opposing side before any fill.
    NoLiquidity,
}

/// Order status with monotonic transitions.
///
/// `New → PartiallyFilled → Filled`, or `* → Cancelled/Rejected`
/// terminally. Resting is not a status: a resting order is New or
/// PartiallyFilled with remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled(CancelReason),
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled(_) | OrderStatus::Rejected(_)
        )
    }
}

/// A client order as tracked by the engine.
///
/// Created at admission, mutated only by the matcher of its symbol,
/// destroyed (logically) when it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Submitter-supplied correlation id, echoed on acks.
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Limit price; absent exactly for Market orders.
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// Monotonic within the symbol; the time key for price-time priority.
    pub submission_seq: u64,
    pub status: OrderStatus,
    /// Engine-local monotonic nanoseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a new admitted order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_order_id: Option<String>,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
        submission_seq: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            client_order_id,
            symbol,
            side,
            order_type,
            price,
            quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            submission_seq,
            status: OrderStatus::New,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Quantity invariant: filled + remaining = original.
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity.as_decimal() + self.remaining_quantity.as_decimal()
            == self.quantity.as_decimal()
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Whether the order is eligible to rest on the book.
    pub fn can_rest(&self) -> bool {
        self.order_type.may_rest()
            && self.price.is_some()
            && !self.remaining_quantity.is_zero()
            && !self.status.is_terminal()
    }

    /// Apply a fill, advancing the status machine.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity; overfills are an
    /// internal invariant violation, never a client error.
    pub fn fill(&mut self, fill_quantity: Quantity, timestamp: i64) {
        assert!(
            fill_quantity.as_decimal() <= self.remaining_quantity.as_decimal(),
            "Fill would exceed remaining quantity"
        );

        self.filled_quantity = self.filled_quantity + fill_quantity;
        self.remaining_quantity = self.remaining_quantity - fill_quantity;

        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = timestamp;

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order (or its residual).
    ///
    /// # Panics
    /// Panics if the order is already terminal; the engine checks
    /// terminality before issuing cancels.
    pub fn cancel(&mut self, reason: CancelReason, timestamp: i64) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled(reason);
        self.updated_at = timestamp;
    }

    /// Terminal transition for a Market order that emptied the opposing
    /// side: the residual is cancelled, and the order closes `Filled`
    /// when at least one fill occurred, else `Cancelled(NoLiquidity)`.
    pub fn exhaust_liquidity(&mut self, timestamp: i64) {
        assert!(!self.status.is_terminal(), "order already terminal");
        self.status = if self.has_fills() {
            OrderStatus::Filled
        } else {
            OrderStatus::Cancelled(CancelReason::NoLiquidity)
        };
        self.updated_at = timestamp;
    }

    /// Reject the order terminally.
    pub fn reject(&mut self, reason: RejectReason, timestamp: i64) {
        self.status = OrderStatus::Rejected(reason);
        self.updated_at = timestamp;
    }
}
