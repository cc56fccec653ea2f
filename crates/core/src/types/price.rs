//! Type-safe price representation using decimal arithmetic.
//!
//! Prices travel over the wire as JSON numbers (the backend stores floats),
//! but every sum and every displayed amount is computed on [`Decimal`] so
//! that `25.99 + 45.99` is exactly `71.98`. Amounts a float cannot carry
//! exactly are written as decimal strings instead.
//!
//! Parsed amounts are bounded by [`Price::MAX_WHOLE_UNITS`] in magnitude.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of decimal places used when displaying an amount.
const DISPLAY_SCALE: u32 = 2;

/// Errors parsing a price.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("not a decimal amount: {0}")]
    Invalid(#[from] rust_decimal::Error),
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// A monetary amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest magnitude accepted when parsing, in whole currency units.
    pub const MAX_WHOLE_UNITS: i64 = 1_000_000_000;

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, DISPLAY_SCALE))
    }

    /// The exact decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Create a price, rejecting amounts beyond [`Price::MAX_WHOLE_UNITS`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError::OutOfRange` for an oversized amount.
    pub fn bounded(amount: Decimal) -> Result<Self, PriceError> {
        if amount.abs() > Decimal::from(Self::MAX_WHOLE_UNITS) {
            return Err(PriceError::OutOfRange(amount));
        }
        Ok(Self(amount))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Round to two decimal places, midpoints away from zero (half-up).
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        let mut rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(DISPLAY_SCALE);
        rounded
    }

    /// Format for display with exactly two decimals (e.g. `"71.98"`).
    #[must_use]
    pub fn display(&self) -> String {
        self.rounded().to_string()
    }

    /// The amount as a float, if the float reads back as the same amount.
    fn exact_f64(&self) -> Option<f64> {
        let value = self.0.to_f64()?;
        let back = Decimal::from_str(&value.to_string()).ok()?;
        (back == self.0).then_some(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::bounded(Decimal::from_str(s.trim())?)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at the `Decimal` limits instead of overflowing.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.exact_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Accepts JSON numbers as well as numeric strings (form inputs arrive as text).
struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a number or numeric string of at most {} in magnitude",
            Price::MAX_WHOLE_UNITS
        )
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Price::bounded(Decimal::from(value))
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Price::bounded(Decimal::from(value))
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        // Shortest round-trip representation keeps 25.99 as 25.99
        Decimal::from_str(&value.to_string())
            .or_else(|_| Decimal::from_scientific(&format!("{value:e}")))
            .map_err(PriceError::from)
            .and_then(Price::bounded)
            .map_err(|_| E::invalid_value(de::Unexpected::Float(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value
            .parse::<Price>()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Price = [price("25.99"), price("45.99")].iter().sum();
        assert_eq!(total.display(), "71.98");
    }

    #[test]
    fn test_display_pads_to_two_decimals() {
        assert_eq!(Price::ZERO.display(), "0.00");
        assert_eq!(price("5").display(), "5.00");
        assert_eq!(price("5.5").display(), "5.50");
    }

    #[test]
    fn test_display_rounds_half_up() {
        assert_eq!(price("0.125").display(), "0.13");
        assert_eq!(price("0.135").display(), "0.14");
        assert_eq!(price("2.344").display(), "2.34");
        assert_eq!(price("-0.125").display(), "-0.13");
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(2599), price("25.99"));
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("25.99").unwrap();
        let from_string: Price = serde_json::from_str("\"25.99\"").unwrap();
        let from_int: Price = serde_json::from_str("12").unwrap();
        assert_eq!(from_number, price("25.99"));
        assert_eq!(from_string, price("25.99"));
        assert_eq!(from_int, price("12"));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Price>("\"cheap\"").is_err());
        assert!(serde_json::from_str::<Price>("true").is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&price("45.99")).unwrap(), "45.99");
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        let huge = Price::new(Decimal::MAX);
        let total: Price = [huge, huge, price("1")].iter().sum();
        assert_eq!(total, huge);
        let lowest = Price::new(Decimal::MIN);
        assert_eq!(lowest + lowest, lowest);
    }

    #[test]
    fn test_oversized_amounts_are_rejected() {
        assert!(matches!(
            "50000000000000000000000000000".parse::<Price>(),
            Err(PriceError::OutOfRange(_))
        ));
        assert!(matches!("-1000000000.01".parse::<Price>(), Err(PriceError::OutOfRange(_))));
        assert_eq!(price("1000000000").display(), "1000000000.00");
        assert!(serde_json::from_str::<Price>("1e20").is_err());
        assert!(serde_json::from_str::<Price>("\"50000000000000000000000000000\"").is_err());
        assert!(serde_json::from_str::<Price>("18446744073709551615").is_err());
    }

    #[test]
    fn test_high_precision_survives_serialization() {
        let precise = price("0.1234567890123456789");
        let json = serde_json::to_string(&precise).unwrap();
        assert_eq!(json, "\"0.1234567890123456789\"");
        assert_eq!(serde_json::from_str::<Price>(&json).unwrap(), precise);
    }

    #[test]
    fn test_is_negative() {
        assert!(price("-1").is_negative());
        assert!(!Price::ZERO.is_negative());
        assert!(!price("0.01").is_negative());
    }
}
