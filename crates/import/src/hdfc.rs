//! HDFC Bank credit card statements.
//!
//! Two layouts exist. The older one is pipe-delimited with a time and a
//! `C`/`D` flag:
//!
//! ```text
//! 19/10/2025| 15:28 ANAND SWEETS AND SAVOURBANGALORE C 2,250.00
//! ```
//!
//! The newer one is space-delimited, with optional seconds-resolution time,
//! optional reward points before the amount and a trailing `Cr` on credits:
//!
//! ```text
//! 20/06/2025 11:53:21 RXDX WHITEFIELD RECEPTBENGALURU 16 650.00
//! 02/07/2025 10:26:34 NETBANKING TRANSFER (Ref# 0000) 45,741.62 Cr
//! ```
//!
//! The newer layout is only tried when the older one finds nothing.

use expensetrend_core::Direction;

use crate::layout::RawMatch;

re!(re_pipe_row,
    r"(\d{2}/\d{2}/\d{4})\|\s*\d{2}:\d{2}\s+(.+?)\s+([CD])\s+([\d,]+\.\d{2})");
re!(re_pipe_points,
    r"\s*\+\s*\d+$");
re!(re_spaced_row,
    r"(?m)(\d{2}/\d{2}/\d{4})(?:\s+\d{2}:\d{2}:\d{2})?\s+(.+?)\s+([\d,]+\.\d{2})(\s+Cr)?\s*$");
re!(re_spaced_points,
    r"\s+-?\d+$");

pub fn extract(text: &str) -> Vec<RawMatch> {
    let rows = extract_pipe_delimited(text);
    if !rows.is_empty() {
        return rows;
    }
    extract_space_delimited(text)
}

fn extract_pipe_delimited(text: &str) -> Vec<RawMatch> {
    re_pipe_row()
        .captures_iter(text)
        .map(|c| {
            let description = re_pipe_points().replace(c[2].trim(), "");
            // `C` is a charge, `D` a credit back to the card.
            let direction = if &c[3] == "D" { Direction::Credit } else { Direction::Debit };
            RawMatch::new(&c[1], &description, &c[4], direction)
        })
        .collect()
}

fn extract_space_delimited(text: &str) -> Vec<RawMatch> {
    re_spaced_row()
        .captures_iter(text)
        .map(|c| {
            let description = re_spaced_points().replace(c[2].trim(), "");
            let direction = if c.get(4).is_some() { Direction::Credit } else { Direction::Debit };
            RawMatch::new(&c[1], &description, &c[3], direction)
        })
        .collect()
}
