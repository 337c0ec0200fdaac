//! Reporting over the store: each call takes a fresh snapshot, narrows it by
//! the fields the store can match, then runs the in-memory report.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use expensetrend_core::report::{self, category_breakdown, monthly_trend, paginate, sort_expenses};
use expensetrend_core::{
    Category, CategoryBreakdown, Direction, ExpenseFilter, ExpenseUpdate, MonthlyTrend, Page,
    SortKey, SortOrder, StoredExpense, Summary, UpdateError, ValidatedUpdate,
};

use crate::store::{DistinctField, ExpenseStore, StoreError, StoreFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub filter: ExpenseFilter,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    /// 1-indexed.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        TransactionQuery {
            filter: ExpenseFilter::debits(),
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: 25,
        }
    }
}

/// Values for the dashboard's filter dropdowns, each sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Banks present among debits.
    pub banks: Vec<String>,
    /// Categories present among debits.
    pub categories: Vec<String>,
    pub all_categories: Vec<String>,
    pub transaction_types: Vec<String>,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn ExpenseStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ExpenseStore> {
        &self.store
    }

    async fn snapshot(&self, filter: &ExpenseFilter) -> Result<Vec<StoredExpense>, StoreError> {
        let rows = self.store.find_all(&StoreFilter::from(filter)).await?;
        Ok(filter.apply(rows))
    }

    pub async fn monthly_trend(&self) -> Result<MonthlyTrend, StoreError> {
        let debits = self.snapshot(&ExpenseFilter::debits()).await?;
        Ok(monthly_trend(&debits))
    }

    /// Debit totals per category. Any direction in `filter` is ignored.
    pub async fn category_breakdown(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<CategoryBreakdown, StoreError> {
        let filter = ExpenseFilter { direction: Some(Direction::Debit), ..filter.clone() };
        let debits = self.snapshot(&filter).await?;
        Ok(category_breakdown(&debits))
    }

    pub async fn transactions(&self, query: &TransactionQuery) -> Result<Page, StoreError> {
        let mut rows = self.snapshot(&query.filter).await?;
        sort_expenses(&mut rows, query.sort_by, query.sort_order);
        Ok(paginate(rows, query.page, query.page_size))
    }

    /// Debits whose description contains `needle`, ignoring case.
    pub async fn search(&self, needle: &str) -> Result<Vec<StoredExpense>, StoreError> {
        let filter = StoreFilter {
            description_contains: Some(needle.to_string()),
            ..StoreFilter::debits()
        };
        self.store.find_all(&filter).await
    }

    pub async fn filters(&self) -> Result<FilterOptions, StoreError> {
        let debits = StoreFilter::debits();
        let banks = self.store.distinct_values(DistinctField::Bank, &debits).await?;
        let categories = self.store.distinct_values(DistinctField::Category, &debits).await?;

        let mut all_categories: Vec<String> =
            Category::ALL.iter().map(|c| c.as_str().to_string()).collect();
        all_categories.sort_unstable();
        let mut transaction_types: Vec<String> =
            Direction::ALL.iter().map(|d| d.as_str().to_string()).collect();
        transaction_types.sort_unstable();

        Ok(FilterOptions {
            banks: banks.into_iter().collect(),
            categories: categories.into_iter().collect(),
            all_categories,
            transaction_types,
        })
    }

    pub async fn summary(&self) -> Result<Summary, StoreError> {
        let debits = self.snapshot(&ExpenseFilter::debits()).await?;
        Ok(report::summary(&debits))
    }

    /// Validate and apply a relabel. Invalid values, an empty request and
    /// an unknown id are distinct errors.
    pub async fn update(&self, id: i64, update: &ExpenseUpdate) -> Result<ValidatedUpdate, UpdateError> {
        let validated = update.validate()?;
        let found = self
            .store
            .update_one(id, &validated)
            .await
            .map_err(|e| UpdateError::Storage(e.to_string()))?;
        if !found {
            return Err(UpdateError::NotFound(id.to_string()));
        }
        info!(id, ?validated, "relabelled transaction");
        Ok(validated)
    }
}
