use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A statement amount, held at two fractional digits.
///
/// Serializes as a JSON number so the persisted/served record shape carries a
/// plain decimal `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Amounts only enter through `from_cents` or `parse_statement_amount`,
    /// both of which keep the value inside the i64 cent range.
    pub fn to_cents(self) -> i64 {
        self.0
            .checked_mul(Decimal::from(100))
            .and_then(|c| c.round().to_i64())
            .unwrap_or_default()
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Parse an amount token as printed on a statement (`1,234.56`).
    ///
    /// Thousands separators are stripped first. Returns `None` for anything
    /// that is not a non-negative decimal representable in cents.
    pub fn parse_statement_amount(token: &str) -> Option<Self> {
        let cleaned = token.trim().replace(',', "");
        let dec = Decimal::from_str(&cleaned).ok()?;
        if dec.is_sign_negative() {
            return None;
        }
        let cents = dec.checked_mul(Decimal::from(100))?.round().to_i64()?;
        Some(Money::from_cents(cents))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
