pub mod bank;
pub mod category;
pub mod config;
pub mod date;
pub mod expense;
pub mod money;
pub mod report;
pub mod update;

pub use bank::{Bank, BankCredentials, BankProfile, BANK_PROFILES};
pub use category::{categorize, Category, CATEGORY_KEYWORDS};
pub use config::{AppConfig, ConfigError};
pub use expense::{Direction, ExpenseItem, StoredExpense};
pub use money::Money;
pub use report::{
    CategoryBreakdown, ExpenseFilter, MonthlyTrend, Page, SortKey, SortOrder, Summary,
};
pub use update::{ExpenseUpdate, UpdateError, ValidatedUpdate};
