use expensetrend_core::{Bank, Direction};
use serde::Serialize;

use crate::{generic, hdfc, idfc, sbi};

/// One line item exactly as matched in statement text, before date
/// normalization, amount parsing and categorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawMatch {
    pub date: String,
    pub description: String,
    /// Amount token with thousands separators removed.
    pub amount: String,
    pub direction: Direction,
}

impl RawMatch {
    pub(crate) fn new(date: &str, description: &str, amount: &str, direction: Direction) -> Self {
        RawMatch {
            date: date.to_string(),
            description: description.trim().to_string(),
            amount: amount.replace(',', ""),
            direction,
        }
    }
}

/// Statement layout used to extract line items, one per supported bank plus
/// a generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Hdfc,
    Sbi,
    Idfc,
    Generic,
}

impl Layout {
    pub fn for_bank(bank: &Bank) -> Self {
        match bank {
            Bank::Hdfc => Layout::Hdfc,
            Bank::Sbi => Layout::Sbi,
            Bank::Idfc => Layout::Idfc,
            Bank::Other(_) => Layout::Generic,
        }
    }

    /// Extract raw line items from the full statement text. Zero matches is
    /// a valid outcome.
    pub fn extract(self, text: &str) -> Vec<RawMatch> {
        match self {
            Layout::Hdfc => hdfc::extract(text),
            Layout::Sbi => sbi::extract(text),
            Layout::Idfc => idfc::extract(text),
            Layout::Generic => generic::extract(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_per_bank() {
        assert_eq!(Layout::for_bank(&Bank::Hdfc), Layout::Hdfc);
        assert_eq!(Layout::for_bank(&Bank::Sbi), Layout::Sbi);
        assert_eq!(Layout::for_bank(&Bank::Idfc), Layout::Idfc);
        assert_eq!(Layout::for_bank(&Bank::from_key("axis")), Layout::Generic);
    }

    #[test]
    fn raw_match_strips_separators_and_trims() {
        let m = RawMatch::new("01/01/2026", "  SHOP  ", "1,23,456.00", Direction::Debit);
        assert_eq!(m.description, "SHOP");
        assert_eq!(m.amount, "123456.00");
    }

    #[test]
    fn empty_text_yields_nothing() {
        for layout in [Layout::Hdfc, Layout::Sbi, Layout::Idfc, Layout::Generic] {
            assert!(layout.extract("").is_empty());
        }
    }
}
