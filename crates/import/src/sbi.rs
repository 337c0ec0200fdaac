//! SBI Card statements: `DD Mon YY`, description, amount and a one-letter
//! type flag (`C` credit, `D` or `M` debit).

use expensetrend_core::Direction;

use crate::layout::RawMatch;

re!(re_row, r"(\d{2}\s+\w{3}\s+\d{2})\s+(.+?)\s+([\d,]+\.\d{2})\s+([MDC])");

pub fn extract(text: &str) -> Vec<RawMatch> {
    re_row()
        .captures_iter(text)
        .map(|c| {
            let direction = if &c[4] == "C" { Direction::Credit } else { Direction::Debit };
            RawMatch::new(&c[1], &c[2], &c[3], direction)
        })
        .collect()
}
