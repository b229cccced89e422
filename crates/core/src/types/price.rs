//! Type-safe price representation using decimal arithmetic.
//!
//! The storefront trades in a single currency (KES), so [`Price`] is a
//! thin wrapper around [`Decimal`] rather than an amount/currency pair.
//! The remote API serializes prices as plain JSON numbers while the
//! session snapshot round-trips through our own serializer, so `Price`
//! accepts both numeric and string forms on deserialization.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A monetary amount in KES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// A zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create a price from a whole number of shillings.
    #[must_use]
    pub fn from_whole(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total: unit price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl fmt::Display for Price {
    /// Formats as `Ksh 1,234`, matching how the storefront displays
    /// prices everywhere. Trailing zeros are trimmed, so a fractional
    /// amount renders as `Ksh 1,234.5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ksh {}", group_thousands(&self.0.normalize().to_string()))
    }
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(raw: &str) -> String {
    let (sign, rest) = raw.strip_prefix('-').map_or(("", raw), |r| ("-", r));
    let (int_part, frac_part) = rest
        .split_once('.')
        .map_or((rest, None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Decimal::try_from(v)
            .map(Price)
            .map_err(|e| E::custom(format!("invalid price {v}: {e}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse::<Decimal>()
            .map(Price)
            .map_err(|e| E::custom(format!("invalid price '{v}': {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grouping() {
        assert_eq!(Price::from_whole(0).to_string(), "Ksh 0");
        assert_eq!(Price::from_whole(200).to_string(), "Ksh 200");
        assert_eq!(Price::from_whole(1500).to_string(), "Ksh 1,500");
        assert_eq!(Price::from_whole(1_234_567).to_string(), "Ksh 1,234,567");
    }

    #[test]
    fn test_display_fractional() {
        let price = Price::new("1234.50".parse().unwrap());
        assert_eq!(price.to_string(), "Ksh 1,234.5");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_whole(100);
        assert_eq!(unit.times(2), Price::from_whole(200));

        let total: Price = [Price::from_whole(100), Price::from_whole(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_whole(350));
    }

    #[test]
    fn test_deserialize_from_number() {
        let price: Price = serde_json::from_str("1500").unwrap();
        assert_eq!(price, Price::from_whole(1500));

        let price: Price = serde_json::from_str("99.99").unwrap();
        assert_eq!(price, Price::new("99.99".parse().unwrap()));
    }

    #[test]
    fn test_deserialize_from_string() {
        let price: Price = serde_json::from_str("\"1500\"").unwrap();
        assert_eq!(price, Price::from_whole(1500));
    }

    #[test]
    fn test_serde_round_trip() {
        let price = Price::new("245.75".parse().unwrap());
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
