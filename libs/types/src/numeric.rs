//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point
//! errors). All book comparisons are exact decimal comparisons; tick and
//! lot conformance is checked with exact remainders.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Price type with fixed-point decimal representation
///
/// Must always be positive. Serialized as a string to prevent JSON number
/// precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the price is negative or zero
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if invalid
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the price sits on the given tick grid.
    ///
    /// Exact remainder check; a zero or negative tick never conforms.
    pub fn is_multiple_of(&self, tick: Decimal) -> bool {
        tick > Decimal::ZERO && (self.0 % tick).is_zero()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Price subtraction would result in negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Self::Output {
        self.0 * rhs
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity type with fixed-point decimal representation
///
/// Non-negative; zero is reserved for exhausted remainders. Serialized as
/// a string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity from a Decimal
    ///
    /// # Panics
    /// Panics if the quantity is negative or zero
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Quantity must be positive");
        Self(value)
    }

    /// Try to create a Quantity, returning None if not strictly positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create zero quantity (exhausted remainders)
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// Whether the quantity sits on the given lot grid.
    pub fn is_multiple_of(&self, lot: Decimal) -> bool {
        lot > Decimal::ZERO && (self.0 % lot).is_zero()
    }

    /// The smaller of two quantities (fill sizing).
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Saturating subtraction; never goes below zero.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if self.0 > rhs.0 {
            Self(self.0 - rhs.0)
        } else {
            Self(Decimal::ZERO)
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Quantity subtraction would result in negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

// Custom serialization to preserve precision
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        // Zero is allowed on the wire (exhausted remainders, level removals)
        if decimal >= Decimal::ZERO {
            Ok(Self(decimal))
        } else {
            Err(serde::de::Error::custom("Quantity cannot be negative"))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(100);
        assert_eq!(price.as_decimal(), Decimal::from(100));
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_negative_panics() {
        Price::new(Decimal::from(-100));
    }

    #[test]
    fn test_price_tick_conformance() {
        let tick = Decimal::from_str("0.01").unwrap();
        assert!(Price::from_str("100.25").unwrap().is_multiple_of(tick));
        assert!(!Price::from_str("100.005").unwrap().is_multiple_of(tick));
        assert!(!Price::from_u64(100).is_multiple_of(Decimal::ZERO));
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("100.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"100.25\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_quantity_lot_conformance() {
        let lot = Decimal::from_str("0.001").unwrap();
        assert!(Quantity::from_str("1.500").unwrap().is_multiple_of(lot));
        assert!(!Quantity::from_str("1.0005").unwrap().is_multiple_of(lot));
    }

    #[test]
    fn test_quantity_min() {
        let a = Quantity::from_str("2.5").unwrap();
        let b = Quantity::from_str("1.5").unwrap();
        assert_eq!(a.min(b), b);
        assert_eq!(b.min(a), b);
    }

    #[test]
    fn test_quantity_saturating_sub() {
        let a = Quantity::from_str("1.0").unwrap();
        let b = Quantity::from_str("2.5").unwrap();
        assert!(a.saturating_sub(b).is_zero());
        assert_eq!(
            b.saturating_sub(a).as_decimal(),
            Decimal::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::from_str("2.5").unwrap();
        let q2 = Quantity::from_str("1.5").unwrap();

        assert_eq!((q1 + q2).as_decimal(), Decimal::from_str("4.0").unwrap());
        assert_eq!((q1 - q2).as_decimal(), Decimal::from_str("1.0").unwrap());
    }

    #[test]
    fn test_quantity_price_multiplication() {
        let qty = Quantity::from_str("1.5").unwrap();
        let price = Price::from_u64(100);
        assert_eq!(qty * price, Decimal::from(150));
    }

    #[test]
    fn test_deterministic_calculation() {
        // Same inputs always produce the same output
        let q1 = Quantity::from_str("0.123456789").unwrap();
        let p1 = Price::from_str("50000.987654321").unwrap();
        let q2 = Quantity::from_str("0.123456789").unwrap();
        let p2 = Price::from_str("50000.987654321").unwrap();

        assert_eq!(q1 * p1, q2 * p2, "Deterministic calculation failed");
    }
}
