//! Error taxonomy for the matching engine
//!
//! All client-induced errors are recoverable and surfaced as reject acks;
//! the engine never panics on client input. Internal invariant violations
//! (a crossed book after matching) are fatal and asserted, not returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a command is rejected before or instead of execution.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    /// Admission invariants violated (price/quantity sign, tick/lot grid,
    /// price presence per order type).
    #[error("malformed order: {0}")]
    MalformedOrder(String),

    /// Symbol not hosted by this engine instance.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// Cancel target absent from the order index and never seen before.
    #[error("unknown order: {0}")]
    UnknownOrder(String),

    /// Cancel target existed historically but is no longer resting.
    /// Callers wanting idempotent cancels may treat this as success.
    #[error("order already terminal: {0}")]
    AlreadyTerminal(String),

    /// FOK feasibility scan found insufficient quantity within the limit.
    #[error("insufficient liquidity for fill-or-kill")]
    InsufficientLiquidity,

    /// Symbol engine inbox full; the client may retry.
    #[error("engine inbox full, retry later")]
    Backpressure,
}

/// Errors raised by the engine runtime plumbing rather than by matching.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine for {0} has shut down")]
    EngineStopped(String),

    #[error("reply channel dropped before ack")]
    ReplyDropped,
}
