//! In-memory reporting over a snapshot of stored expenses.
//!
//! Every function here tolerates non-canonical dates: they are skipped by
//! date-range filters and month grouping, and sort as the earliest date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::bank::Bank;
use crate::category::Category;
use crate::date::month_key;
use crate::expense::{Direction, StoredExpense};
use crate::money::Money;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub bank: Option<Bank>,
    pub category: Option<Category>,
    pub direction: Option<Direction>,
    /// Inclusive lower bound.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub end: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn debits() -> Self {
        ExpenseFilter { direction: Some(Direction::Debit), ..Default::default() }
    }

    pub fn has_date_range(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn matches(&self, expense: &StoredExpense) -> bool {
        if self.bank.as_ref().is_some_and(|b| *b != expense.bank) {
            return false;
        }
        if self.category.is_some_and(|c| c != expense.category) {
            return false;
        }
        if self.direction.is_some_and(|d| d != expense.direction) {
            return false;
        }
        if self.has_date_range() {
            let Some(date) = expense.parsed_date() else {
                return false;
            };
            if self.start.is_some_and(|s| date < s) || self.end.is_some_and(|e| date > e) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, expenses: Vec<StoredExpense>) -> Vec<StoredExpense> {
        expenses.into_iter().filter(|e| self.matches(e)).collect()
    }
}

// ── Monthly trend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankSeries {
    pub bank: Bank,
    /// One total per entry of [`MonthlyTrend::months`].
    pub totals: Vec<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub months: Vec<String>,
    pub datasets: Vec<BankSeries>,
}

/// Debit totals per bank per `YYYY-MM`, zero-filled across the shared month axis.
pub fn monthly_trend(expenses: &[StoredExpense]) -> MonthlyTrend {
    let mut by_bank: BTreeMap<&str, BTreeMap<String, Money>> = BTreeMap::new();
    let mut months: BTreeSet<String> = BTreeSet::new();

    for e in expenses.iter().filter(|e| e.is_debit()) {
        let Some(date) = e.parsed_date() else {
            continue;
        };
        let key = month_key(date);
        *by_bank.entry(e.bank.key()).or_default().entry(key.clone()).or_default() += e.amount;
        months.insert(key);
    }

    let months: Vec<String> = months.into_iter().collect();
    let datasets = by_bank
        .into_iter()
        .map(|(bank, monthly)| BankSeries {
            bank: Bank::from_key(bank),
            totals: months
                .iter()
                .map(|m| monthly.get(m).copied().unwrap_or_default())
                .collect(),
        })
        .collect();

    MonthlyTrend { months, datasets }
}

// ── Category breakdown ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub categories: Vec<Category>,
    pub amounts: Vec<Money>,
}

/// Sum debit amounts per category, largest first (ties keep first-seen order).
pub fn category_breakdown(expenses: &[StoredExpense]) -> CategoryBreakdown {
    let mut totals = category_totals(expenses);
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    let (categories, amounts) = totals.into_iter().unzip();
    CategoryBreakdown { categories, amounts }
}

fn category_totals(expenses: &[StoredExpense]) -> Vec<(Category, Money)> {
    let mut totals: Vec<(Category, Money)> = Vec::new();
    for e in expenses.iter().filter(|e| e.is_debit()) {
        match totals.iter_mut().find(|(c, _)| *c == e.category) {
            Some((_, total)) => *total += e.amount,
            None => totals.push((e.category, e.amount)),
        }
    }
    totals
}

// ── Sorting and pagination ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Stable sort; unparseable dates sort as the earliest possible date.
pub fn sort_expenses(expenses: &mut [StoredExpense], key: SortKey, order: SortOrder) {
    match (key, order) {
        (SortKey::Date, SortOrder::Asc) => expenses.sort_by_key(sort_date),
        (SortKey::Date, SortOrder::Desc) => expenses.sort_by(|a, b| sort_date(b).cmp(&sort_date(a))),
        (SortKey::Amount, SortOrder::Asc) => expenses.sort_by_key(|e| e.amount),
        (SortKey::Amount, SortOrder::Desc) => expenses.sort_by(|a, b| b.amount.cmp(&a.amount)),
    }
}

fn sort_date(e: &StoredExpense) -> NaiveDate {
    e.parsed_date().unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub transactions: Vec<StoredExpense>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slice out 1-indexed page `page`; pages past the end are empty.
pub fn paginate(expenses: Vec<StoredExpense>, page: usize, page_size: usize) -> Page {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = expenses.len();
    let total_pages = total.div_ceil(page_size);
    let transactions = expenses
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Page { transactions, total, page, page_size, total_pages }
}

// ── Summary ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_spent: Money,
    pub transaction_count: usize,
    pub top_category: Option<Category>,
}

pub fn summary(expenses: &[StoredExpense]) -> Summary {
    let debits: Vec<&StoredExpense> = expenses.iter().filter(|e| e.is_debit()).collect();
    let total_spent: Money = debits.iter().map(|e| e.amount).sum();

    // First category to reach the maximum wins a tie.
    let mut top: Option<(Category, Money)> = None;
    for (category, total) in category_totals(expenses) {
        if top.map_or(true, |(_, best)| total > best) {
            top = Some((category, total));
        }
    }

    Summary {
        total_spent,
        transaction_count: debits.len(),
        top_category: top.map(|(c, _)| c),
    }
}
