use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Canonical stored date format.
pub const CANONICAL_FORMAT: &str = "%d/%m/%Y";

/// Two-digit years below the pivot land in the 2000s, the rest in the 1900s
/// (`00..=68` → `20YY`, `69..=99` → `19YY`).
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 69;

#[derive(Debug, Clone, Copy)]
enum Month {
    Numeric,
    Abbreviated,
}

#[derive(Debug, Clone, Copy)]
enum Year {
    TwoDigit,
    FourDigit,
}

struct DateShape {
    pattern: &'static str,
    month: Month,
    year: Year,
}

/// Tried in order; the first shape that yields a valid calendar date wins.
const SHAPES: &[DateShape] = &[
    DateShape { pattern: r"^(\d{1,2})/(\d{1,2})/(\d{4})$", month: Month::Numeric, year: Year::FourDigit },
    DateShape { pattern: r"^(\d{1,2})-(\d{1,2})-(\d{4})$", month: Month::Numeric, year: Year::FourDigit },
    DateShape { pattern: r"^(\d{1,2}) ([A-Za-z]{3}) (\d{2})$", month: Month::Abbreviated, year: Year::TwoDigit },
    DateShape { pattern: r"^(\d{1,2}) ([A-Za-z]{3}) (\d{4})$", month: Month::Abbreviated, year: Year::FourDigit },
];

fn compiled_shapes() -> &'static [Regex] {
    static R: OnceLock<Vec<Regex>> = OnceLock::new();
    R.get_or_init(|| {
        SHAPES
            .iter()
            .map(|s| Regex::new(s.pattern).expect("invalid regex"))
            .collect()
    })
}

fn re_whitespace() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"))
}

/// Normalize a statement date to `DD/MM/YYYY`.
///
/// Returns the input unchanged when no supported shape matches.
pub fn normalize(raw: &str) -> String {
    match parse_statement_date(raw) {
        Some(date) => format_canonical(date),
        None => raw.to_string(),
    }
}

/// Parse any supported statement date shape.
pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = re_whitespace().replace_all(raw.trim(), " ");
    SHAPES
        .iter()
        .zip(compiled_shapes())
        .find_map(|(shape, re)| match_shape(shape, re, &cleaned))
}

/// Parse a stored canonical `DD/MM/YYYY` date.
pub fn parse_canonical(s: &str) -> Option<NaiveDate> {
    match_shape(&SHAPES[0], &compiled_shapes()[0], s.trim())
}

fn match_shape(shape: &DateShape, re: &Regex, s: &str) -> Option<NaiveDate> {
    let c = re.captures(s)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month = match shape.month {
        Month::Numeric => c.get(2)?.as_str().parse().ok()?,
        Month::Abbreviated => abbr_month_to_num(c.get(2)?.as_str())?,
    };
    let year: i32 = c.get(3)?.as_str().parse().ok()?;
    let year = match shape.year {
        Year::TwoDigit => expand_two_digit_year(year),
        Year::FourDigit => year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// `YYYY-MM` grouping key.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn expand_two_digit_year(y: i32) -> i32 {
    if y < TWO_DIGIT_YEAR_PIVOT {
        2000 + y
    } else {
        1900 + y
    }
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}
