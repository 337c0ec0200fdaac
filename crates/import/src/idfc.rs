//! IDFC FIRST Bank statements. Two row shapes are in circulation, one with
//! `DD Mon YY` dates and one with `DD/MM/YYYY`, both ending in a `CR`/`DR`
//! marker in any case.
//!
//! Every match of the first shape is returned before every match of the
//! second. Text matching both is returned twice.

use expensetrend_core::Direction;
use regex::Captures;

use crate::layout::RawMatch;

re!(re_short_date_row, r"(?i)(\d{2}\s+\w{3}\s+\d{2})\s+(.+?)\s+([\d,]+\.\d{2})\s+(CR|DR)");
re!(re_slash_date_row, r"(?i)(\d{2}/\d{2}/\d{4})\s+(.+?)\s+([\d,]+\.\d{2})\s+(CR|DR)");

pub fn extract(text: &str) -> Vec<RawMatch> {
    re_short_date_row()
        .captures_iter(text)
        .chain(re_slash_date_row().captures_iter(text))
        .map(|c| to_match(&c))
        .collect()
}

fn to_match(c: &Captures<'_>) -> RawMatch {
    let direction = if c[4].eq_ignore_ascii_case("CR") { Direction::Credit } else { Direction::Debit };
    RawMatch::new(&c[1], &c[2], &c[3], direction)
}
