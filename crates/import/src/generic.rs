//! Fallback for banks without a dedicated layout. Every row is treated as a
//! debit. Matches of the three date shapes are concatenated in order:
//! `DD/MM/YYYY`, `DD-MM-YYYY`, `DD Mon YYYY`.

use expensetrend_core::Direction;

use crate::layout::RawMatch;

re!(re_slash_row, r"(\d{2}/\d{2}/\d{4})\s+(.+?)\s+([\d,]+\.\d{2})");
re!(re_dash_row, r"(\d{2}-\d{2}-\d{4})\s+(.+?)\s+([\d,]+\.\d{2})");
re!(re_month_name_row, r"(\d{2}\s+\w{3}\s+\d{4})\s+(.+?)\s+([\d,]+\.\d{2})");

pub fn extract(text: &str) -> Vec<RawMatch> {
    [re_slash_row(), re_dash_row(), re_month_name_row()]
        .into_iter()
        .flat_map(|re| re.captures_iter(text))
        .map(|c| RawMatch::new(&c[1], &c[2], &c[3], Direction::Debit))
        .collect()
}
