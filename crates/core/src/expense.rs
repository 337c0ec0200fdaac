use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bank::Bank;
use crate::category::Category;
use crate::date;
use crate::money::Money;

/// Whether a transaction increases (`Debit`) or decreases (`Credit`) the
/// amount owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Debit, Direction::Credit];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Direction::Debit),
            "credit" => Ok(Direction::Credit),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

/// One canonical statement line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// `DD/MM/YYYY`, or the raw statement text when it could not be normalized.
    pub date: String,
    pub description: String,
    pub amount: Money,
    #[serde(rename = "transaction_type")]
    pub direction: Direction,
    pub bank: Bank,
    pub category: Category,
}

impl ExpenseItem {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        date::parse_canonical(&self.date)
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }
}

/// An [`ExpenseItem`] with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredExpense {
    pub id: i64,
    #[serde(flatten)]
    pub item: ExpenseItem,
}

impl std::ops::Deref for StoredExpense {
    type Target = ExpenseItem;

    fn deref(&self) -> &ExpenseItem {
        &self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample() -> ExpenseItem {
        ExpenseItem {
            date: "19/10/2025".to_string(),
            description: "ANAND SWEETS AND SAVOURBANGALORE".to_string(),
            amount: Money::from_cents(225_000),
            direction: Direction::Debit,
            bank: Bank::Hdfc,
            category: Category::Food,
        }
    }

    #[test]
    fn direction_str_roundtrip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_str(d.as_str()).unwrap(), d);
        }
        assert!(Direction::from_str("refund").is_err());
    }

    #[test]
    fn persisted_shape() {
        let stored = StoredExpense { id: 7, item: sample() };
        let v = serde_json::to_value(&stored).unwrap();
        assert_eq!(v["id"], 7);
        assert_eq!(v["date"], "19/10/2025");
        assert_eq!(v["amount"], 2250.0);
        assert_eq!(v["transaction_type"], "debit");
        assert_eq!(v["bank"], "hdfc");
        assert_eq!(v["category"], "food");
    }

    #[test]
    fn parsed_date_tolerates_raw_text() {
        assert_eq!(sample().parsed_date(), NaiveDate::from_ymd_opt(2025, 10, 19));
        let raw = ExpenseItem { date: "Oct 19".to_string(), ..sample() };
        assert_eq!(raw.parsed_date(), None);
    }
}
