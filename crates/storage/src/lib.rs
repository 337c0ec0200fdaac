pub mod db;
pub mod query;
pub mod store;

pub use db::{create_db, create_memory_db, DbPool, SqliteStore};
pub use query::{FilterOptions, QueryService, TransactionQuery};
pub use store::{normalize_dates, DistinctField, ExpenseStore, StoreError, StoreFilter};
