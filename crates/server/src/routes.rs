use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

use expensetrend_core::{
    Bank, Category, CategoryBreakdown, Direction, ExpenseFilter, ExpenseUpdate, Money,
    MonthlyTrend, Page, SortKey, SortOrder, StoredExpense,
};
use expensetrend_storage::{FilterOptions, TransactionQuery};

use crate::error::ApiError;
use crate::AppState;

const DASHBOARD: &str = include_str!("../static/dashboard.html");
const MAX_PAGE_SIZE: i64 = 100;

/// Empty query values mean "not given".
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_day(name: &str, value: &Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    given(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request(format!("{name} must be YYYY-MM-DD (got '{v}')")))
        })
        .transpose()
}

fn parse_enum<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, ApiError> {
    given(value)
        .map(|v| {
            v.parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid {name}: '{v}'")))
        })
        .transpose()
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// GET /api/monthly-trend
pub async fn monthly_trend(State(state): State<AppState>) -> Result<Json<MonthlyTrend>, ApiError> {
    Ok(Json(state.queries.monthly_trend().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct BreakdownParams {
    pub bank: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/category-breakdown
pub async fn category_breakdown(
    State(state): State<AppState>,
    params: Result<Query<BreakdownParams>, QueryRejection>,
) -> Result<Json<CategoryBreakdown>, ApiError> {
    let Query(params) = params?;
    let filter = ExpenseFilter {
        bank: given(&params.bank).map(Bank::from_key),
        start: parse_day("start_date", &params.start_date)?,
        end: parse_day("end_date", &params.end_date)?,
        ..ExpenseFilter::debits()
    };
    Ok(Json(state.queries.category_breakdown(&filter).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionParams {
    pub bank: Option<String>,
    pub category: Option<String>,
    pub transaction_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TransactionParams {
    fn to_query(&self) -> Result<TransactionQuery, ApiError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::bad_request("page must be at least 1"));
        }
        let page_size = self.page_size.unwrap_or(25);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::bad_request(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let sort_by = match given(&self.sort_by) {
            None | Some("date") => SortKey::Date,
            Some("amount") => SortKey::Amount,
            Some(other) => return Err(ApiError::bad_request(format!("Invalid sort_by: '{other}'"))),
        };
        let sort_order = match given(&self.sort_order) {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(ApiError::bad_request(format!("Invalid sort_order: '{other}'")))
            }
        };

        let filter = ExpenseFilter {
            bank: given(&self.bank).map(Bank::from_key),
            category: parse_enum::<Category>("category", &self.category)?,
            direction: Some(
                parse_enum::<Direction>("transaction_type", &self.transaction_type)?
                    .unwrap_or(Direction::Debit),
            ),
            start: parse_day("start_date", &self.start_date)?,
            end: parse_day("end_date", &self.end_date)?,
        };

        Ok(TransactionQuery {
            filter,
            sort_by,
            sort_order,
            page: page as usize,
            page_size: page_size as usize,
        })
    }
}

/// GET /api/transactions
pub async fn transactions(
    State(state): State<AppState>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> Result<Json<Page>, ApiError> {
    let Query(params) = params?;
    let query = params.to_query()?;
    Ok(Json(state.queries.transactions(&query).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub transactions: Vec<StoredExpense>,
    pub total: usize,
}

/// GET /api/transactions/search
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let needle = params
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("description must not be empty"))?;
    let transactions = state.queries.search(needle).await?;
    Ok(Json(SearchResponse { total: transactions.len(), transactions }))
}

/// GET /api/filters
pub async fn filters(State(state): State<AppState>) -> Result<Json<FilterOptions>, ApiError> {
    Ok(Json(state.queries.filters().await?))
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_spent: Money,
    pub transaction_count: usize,
    pub top_category: String,
}

/// GET /api/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.queries.summary().await?;
    Ok(Json(SummaryResponse {
        total_spent: summary.total_spent,
        transaction_count: summary.transaction_count,
        top_category: summary
            .top_category
            .map_or_else(|| "N/A".to_string(), |c| c.as_str().to_string()),
    }))
}

// ── Relabel ───────────────────────────────────────────────────────────────────

/// PUT /api/transactions/{id}
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    // Invalid values are reported before the id is looked at.
    body.validate()?;
    // A malformed id cannot name a stored record.
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::NotFound("Transaction not found".to_string()))?;
    let updated = state.queries.update(id, &body).await?;
    Ok(Json(json!({ "status": "ok", "updated": updated })))
}
