use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid amount: '{0}'")]
pub struct MoneyParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    /// `None` when the amount does not fit in an `i64` number of cents.
    pub fn to_cents(self) -> Option<i64> {
        self.0.checked_mul(Decimal::from(100))?.round().to_i64()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Mean of `total` over `count` entries; zero when there are none.
    pub fn average(total: Money, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money::from_decimal(total.0 / Decimal::from(count as u64))
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Accepts plain decimals as well as `$1,234.56`-style input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean: String = s
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        Decimal::from_str(clean.trim())
            .map(Money::from_decimal)
            .map_err(|_| MoneyParseError(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_roundtrip() {
        assert_eq!(Money::from_cents(1234).to_cents(), Some(1234));
        assert_eq!(Money::from_cents(0).to_cents(), Some(0));
    }

    #[test]
    fn to_cents_is_none_past_decimal_range() {
        let huge: Money = "900000000000000000000000000".parse().unwrap();
        assert_eq!(huge.to_cents(), None);
        let past_i64: Money = "100000000000000000000".parse().unwrap();
        assert_eq!(past_i64.to_cents(), None);
    }

    #[test]
    fn parse_plain_and_symbol_forms() {
        assert_eq!("11.5".parse::<Money>().unwrap(), Money::from_cents(1150));
        assert_eq!("$1,234.56".parse::<Money>().unwrap(), Money::from_cents(123456));
        assert_eq!(" 2024 ".parse::<Money>().unwrap(), Money::from_cents(202400));
    }

    #[test]
    fn parse_rounds_to_cents() {
        assert_eq!("3.14159".parse::<Money>().unwrap(), Money::from_cents(314));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("abc".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn display_two_places() {
        assert_eq!(Money::from_cents(1150).to_string(), "$11.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn sum_and_average() {
        let amounts = [Money::from_cents(1000), Money::from_cents(250), Money::from_cents(50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_cents(1300));
        assert_eq!(Money::average(total, 3), Money::from_cents(433));
        assert_eq!(Money::average(total, 0), Money::zero());
    }

    #[test]
    fn positivity() {
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::from_cents(-5).is_positive());
    }
}
