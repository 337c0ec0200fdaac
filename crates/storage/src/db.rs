use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use expensetrend_core::{Bank, Category, Direction, ExpenseItem, Money, StoredExpense, ValidatedUpdate};

use crate::store::{DistinctField, ExpenseStore, StoreError, StoreFilter};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    open(options).await
}

/// A private in-memory database, gone when the pool is dropped.
pub async fn create_memory_db() -> Result<DbPool, sqlx::Error> {
    open(SqliteConnectOptions::from_str("sqlite::memory:")?).await
}

async fn open(options: SqliteConnectOptions) -> Result<DbPool, sqlx::Error> {
    // One connection: an in-memory database exists per connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            transaction_type TEXT NOT NULL,
            bank TEXT NOT NULL,
            category TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

type ExpenseRow = (i64, String, String, i64, String, String, String);

const SELECT_EXPENSES: &str =
    "SELECT id, date, description, amount_cents, transaction_type, bank, category FROM expenses";

fn row_to_expense(r: ExpenseRow) -> Result<StoredExpense, StoreError> {
    let id = r.0;
    let direction = Direction::from_str(&r.4)
        .map_err(|message| StoreError::InvalidRow { id, message })?;
    let category = Category::from_str(&r.6)
        .map_err(|message| StoreError::InvalidRow { id, message })?;
    Ok(StoredExpense {
        id,
        item: ExpenseItem {
            date: r.1,
            description: r.2,
            amount: Money::from_cents(r.3),
            direction,
            bank: Bank::from_key(&r.5),
            category,
        },
    })
}

/// Field-equality clauses. The description filter is applied in memory after
/// the fetch.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &StoreFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(bank) = &filter.bank {
        qb.push(" AND bank = ").push_bind(bank.key().to_string());
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(direction) = filter.direction {
        qb.push(" AND transaction_type = ").push_bind(direction.as_str());
    }
}

/// [`ExpenseStore`] backed by a SQLite pool. Amounts are kept as integer cents.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(create_db(path).await?))
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(create_memory_db().await?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ExpenseStore for SqliteStore {
    async fn insert_many(&self, items: &[ExpenseItem]) -> Result<u64, StoreError> {
        if items.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        for item in items {
            sqlx::query(
                "INSERT INTO expenses (date, description, amount_cents, transaction_type, bank, category) VALUES (?, ?, ?, ?, ?, ?)"
            )
            .bind(&item.date)
            .bind(&item.description)
            .bind(item.amount.to_cents())
            .bind(item.direction.as_str())
            .bind(item.bank.key())
            .bind(item.category.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(items.len() as u64)
    }

    async fn find_all(&self, filter: &StoreFilter) -> Result<Vec<StoredExpense>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_EXPENSES);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");
        let rows = qb.build_query_as::<ExpenseRow>().fetch_all(&self.pool).await?;
        let mut expenses = Vec::with_capacity(rows.len());
        for row in rows {
            let expense = row_to_expense(row)?;
            if filter.matches_description(&expense.description) {
                expenses.push(expense);
            }
        }
        Ok(expenses)
    }

    async fn update_one(&self, id: i64, update: &ValidatedUpdate) -> Result<bool, StoreError> {
        if update.direction.is_none() && update.category.is_none() {
            let found = sqlx::query_scalar::<_, i64>("SELECT id FROM expenses WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            return Ok(found.is_some());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE expenses SET ");
        let mut assignments = qb.separated(", ");
        if let Some(direction) = update.direction {
            assignments.push("transaction_type = ");
            assignments.push_bind_unseparated(direction.as_str());
        }
        if let Some(category) = update.category {
            assignments.push("category = ");
            assignments.push_bind_unseparated(category.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id);

        // SQLite counts matched rows, so relabelling to the current value
        // still reports the record as found.
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_date(&self, id: i64, date: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE expenses SET date = ? WHERE id = ?")
            .bind(date)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM expenses")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn distinct_values(
        &self,
        field: DistinctField,
        filter: &StoreFilter,
    ) -> Result<BTreeSet<String>, StoreError> {
        if filter.description_contains.is_some() {
            let matching = self.find_all(filter).await?;
            return Ok(matching
                .iter()
                .map(|e| match field {
                    DistinctField::Bank => e.bank.key().to_string(),
                    DistinctField::Category => e.category.as_str().to_string(),
                    DistinctField::Direction => e.direction.as_str().to_string(),
                })
                .collect());
        }

        let column = field.column();
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT DISTINCT {column} FROM expenses"));
        push_filter(&mut qb, filter);
        let values = qb.build_query_scalar::<String>().fetch_all(&self.pool).await?;
        Ok(values.into_iter().collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
