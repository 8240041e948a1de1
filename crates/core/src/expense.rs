use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::category::CategoryConfig;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Money),
    #[error("Amount is too large: {0}")]
    AmountOutOfRange(Money),
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),
}

/// An expense as entered by the user, before it has been stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    /// Raw scan result the form was prefilled from, kept as an opaque blob.
    pub receipt_data: Option<serde_json::Value>,
}

impl NewExpense {
    pub fn new(title: &str, amount: Money, category: &str, date: NaiveDate) -> Self {
        NewExpense {
            title: title.to_string(),
            amount,
            category: category.to_string(),
            date,
            description: None,
            receipt_url: None,
            receipt_data: None,
        }
    }

    pub fn validate(&self, categories: &CategoryConfig) -> Result<(), ExpenseError> {
        if self.title.trim().is_empty() {
            return Err(ExpenseError::MissingField("title"));
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseError::MissingField("category"));
        }
        if !self.amount.is_positive() {
            return Err(ExpenseError::NonPositiveAmount(self.amount));
        }
        if self.amount.to_cents().is_none() {
            return Err(ExpenseError::AmountOutOfRange(self.amount));
        }
        if !categories.contains(&self.category) {
            return Err(ExpenseError::UnknownCategory(self.category.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_data: Option<serde_json::Value>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
