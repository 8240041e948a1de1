use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spendlens_core::{CategoryConfig, ExpenseError, Money, NewExpense};

use crate::types::ScannedReceipt;

/// Title used when the scan found no merchant.
pub const FALLBACK_TITLE: &str = "Receipt";

/// Separator between item lines in the prefilled description.
pub const ITEM_DELIMITER: &str = ", ";

/// An editable expense form seeded from a scan.
///
/// Fields the scan could not fill stay empty (or at the supplied default
/// date); the user completes or overrides them before submitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub receipt_url: Option<String>,
    pub scan: Option<ScannedReceipt>,
}

impl ExpenseDraft {
    /// A blank form for manual entry.
    pub fn blank(today: NaiveDate) -> Self {
        ExpenseDraft {
            title: String::new(),
            amount: None,
            category: None,
            date: today,
            description: String::new(),
            receipt_url: None,
            scan: None,
        }
    }

    pub fn from_scan(scan: &ScannedReceipt, today: NaiveDate) -> Self {
        let title = if scan.merchant.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            scan.merchant.clone()
        };
        let amount = scan.amount.as_deref().and_then(|a| a.parse::<Money>().ok());
        let date = match scan.date.as_deref() {
            Some(raw) => parse_receipt_date(raw).unwrap_or_else(|| {
                tracing::debug!(raw, "could not parse receipt date, keeping default");
                today
            }),
            None => today,
        };

        ExpenseDraft {
            title,
            amount,
            category: None,
            date,
            description: scan.items.join(ITEM_DELIMITER),
            receipt_url: None,
            scan: Some(scan.clone()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_receipt_url(mut self, url: impl Into<String>) -> Self {
        self.receipt_url = Some(url.into());
        self
    }

    /// Submit the form: required fields must be present and valid.
    pub fn into_new_expense(self, categories: &CategoryConfig) -> Result<NewExpense, ExpenseError> {
        let amount = self.amount.ok_or(ExpenseError::MissingField("amount"))?;
        let category = self.category.ok_or(ExpenseError::MissingField("category"))?;
        let description = Some(self.description).filter(|d| !d.trim().is_empty());
        let receipt_data = self.scan.and_then(|s| serde_json::to_value(s).ok());

        let expense = NewExpense {
            title: self.title,
            amount,
            category,
            date: self.date,
            description,
            receipt_url: self.receipt_url,
            receipt_data,
        };
        expense.validate(categories)?;
        Ok(expense)
    }
}

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Best-effort parse of a `1/2/2024`-style date.
///
/// Month-first like US receipts; falls back to day-first when the leading
/// number cannot be a month. Two-digit years pivot at 50.
pub fn parse_receipt_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split(['/', '-']);
    let a: u32 = parts.next()?.parse().ok()?;
    let b: u32 = parts.next()?.parse().ok()?;
    let year = expand_year(parts.next()?.parse().ok()?);
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, a, b).or_else(|| NaiveDate::from_ymd_opt(year, b, a))
}

fn expand_year(y: i32) -> i32 {
    match y {
        0..=49 => 2000 + y,
        50..=99 => 1900 + y,
        _ => y,
    }
}
