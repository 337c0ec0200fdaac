use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::expense::Direction;

/// Relabel request for one stored transaction, as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// A relabel request whose values are members of their closed sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatedUpdate {
    #[serde(rename = "transaction_type", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("transaction_type must be one of: debit, credit (got '{0}')")]
    InvalidDirection(String),
    #[error("category must be one of: {choices} (got '{0}')", choices = valid_categories())]
    InvalidCategory(String),
    #[error("No fields to update")]
    Empty,
    #[error("Transaction not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl UpdateError {
    /// Client mistakes, as opposed to a missing record or a storage failure.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            UpdateError::InvalidDirection(_) | UpdateError::InvalidCategory(_) | UpdateError::Empty
        )
    }
}

fn valid_categories() -> String {
    let mut names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}

impl ExpenseUpdate {
    pub fn validate(&self) -> Result<ValidatedUpdate, UpdateError> {
        let direction = self
            .transaction_type
            .as_deref()
            .map(|s| s.parse().map_err(|_| UpdateError::InvalidDirection(s.to_string())))
            .transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|s| s.parse().map_err(|_| UpdateError::InvalidCategory(s.to_string())))
            .transpose()?;

        if direction.is_none() && category.is_none() {
            return Err(UpdateError::Empty);
        }
        Ok(ValidatedUpdate { direction, category })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(tt: Option<&str>, cat: Option<&str>) -> ExpenseUpdate {
        ExpenseUpdate {
            transaction_type: tt.map(str::to_string),
            category: cat.map(str::to_string),
        }
    }

    #[test]
    fn category_only() {
        let v = update(None, Some("travel")).validate().unwrap();
        assert_eq!(v.direction, None);
        assert_eq!(v.category, Some(Category::Travel));
    }

    #[test]
    fn both_fields() {
        let v = update(Some("credit"), Some("other")).validate().unwrap();
        assert_eq!(v.direction, Some(Direction::Credit));
        assert_eq!(v.category, Some(Category::Other));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!(
            update(Some("refund"), None).validate(),
            Err(UpdateError::InvalidDirection(_))
        ));
        assert!(matches!(
            update(None, Some("misc")).validate(),
            Err(UpdateError::InvalidCategory(_))
        ));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(update(None, None).validate(), Err(UpdateError::Empty)));
    }

    #[test]
    fn error_kinds() {
        assert!(UpdateError::Empty.is_invalid_request());
        assert!(!UpdateError::NotFound("9".into()).is_invalid_request());
    }

    #[test]
    fn validated_update_serializes_only_present_fields() {
        let v = update(None, Some("fuel")).validate().unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"category":"fuel"}"#);
    }

    #[test]
    fn invalid_category_message_lists_choices() {
        let msg = UpdateError::InvalidCategory("misc".into()).to_string();
        assert!(msg.contains("automobiles, electronics"));
    }
}
