use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

use expensetrend_core::{date, Bank, Category, Direction, ExpenseFilter, ExpenseItem, StoredExpense, ValidatedUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored expense {id} is invalid: {message}")]
    InvalidRow { id: i64, message: String },
}

/// Field-equality filters the store evaluates itself. Date ranges are applied
/// in memory by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub bank: Option<Bank>,
    pub category: Option<Category>,
    pub direction: Option<Direction>,
    /// Case-insensitive substring of the description.
    pub description_contains: Option<String>,
}

impl StoreFilter {
    pub fn debits() -> Self {
        StoreFilter { direction: Some(Direction::Debit), ..Default::default() }
    }

    /// Substring test with full Unicode case folding, which SQLite's
    /// `lower()` does not do beyond ASCII.
    pub fn matches_description(&self, description: &str) -> bool {
        self.description_contains
            .as_deref()
            .map_or(true, |needle| description.to_lowercase().contains(&needle.to_lowercase()))
    }
}

impl From<&ExpenseFilter> for StoreFilter {
    fn from(filter: &ExpenseFilter) -> Self {
        StoreFilter {
            bank: filter.bank.clone(),
            category: filter.category,
            direction: filter.direction,
            description_contains: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    Bank,
    Category,
    Direction,
}

impl DistinctField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            DistinctField::Bank => "bank",
            DistinctField::Category => "category",
            DistinctField::Direction => "transaction_type",
        }
    }
}

/// Persistence boundary for canonical expense records.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Batch insert; returns the number of records written.
    async fn insert_many(&self, items: &[ExpenseItem]) -> Result<u64, StoreError>;

    /// All matching records in insertion order.
    async fn find_all(&self, filter: &StoreFilter) -> Result<Vec<StoredExpense>, StoreError>;

    /// Relabel one record. Returns `false` when no record has this id.
    async fn update_one(&self, id: i64, update: &ValidatedUpdate) -> Result<bool, StoreError>;

    /// Rewrite the stored date of one record.
    async fn set_date(&self, id: i64, date: &str) -> Result<bool, StoreError>;

    async fn delete_all(&self) -> Result<u64, StoreError>;

    async fn distinct_values(
        &self,
        field: DistinctField,
        filter: &StoreFilter,
    ) -> Result<BTreeSet<String>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Re-run date normalization over every stored record, writing back the ones
/// that change. Returns how many were rewritten.
pub async fn normalize_dates(store: &dyn ExpenseStore) -> Result<u64, StoreError> {
    let mut updated = 0;
    for expense in store.find_all(&StoreFilter::default()).await? {
        let normalized = date::normalize(&expense.date);
        if normalized != expense.date && store.set_date(expense.id, &normalized).await? {
            updated += 1;
        }
    }
    info!(updated, "normalized stored dates");
    Ok(updated)
}
