//! Matching logic
//!
//! Price-time priority matching for the four supported order types.

pub mod crossing;
pub mod matcher;

pub use crossing::{crosses, price_allows};
pub use matcher::{MatchOutcome, Matcher};
