use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::expense::Expense;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first.
    #[default]
    Date,
    /// Largest first.
    Amount,
    /// Case-insensitive A to Z.
    Title,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "amount" => Ok(SortKey::Amount),
            "title" => Ok(SortKey::Title),
            other => Err(format!("Unknown sort key: '{other}'")),
        }
    }
}

/// Search, category filter and ordering for an expense list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseQuery {
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    /// Exact category name; `None` matches every category.
    pub category: Option<String>,
    pub sort: SortKey,
}

impl ExpenseQuery {
    pub fn matches(&self, expense: &Expense) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                expense.title.to_lowercase().contains(&term)
                    || expense
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
        };
        let matches_category = self
            .category
            .as_deref()
            .map_or(true, |c| expense.category == c);
        matches_search && matches_category
    }

    /// Filter then stable-sort `expenses` according to this query.
    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        let mut out: Vec<&Expense> = expenses.iter().filter(|e| self.matches(e)).collect();
        out.sort_by(|a, b| compare(self.sort, a, b));
        out
    }
}

fn compare(key: SortKey, a: &Expense, b: &Expense) -> Ordering {
    match key {
        SortKey::Date => b.date.cmp(&a.date),
        SortKey::Amount => b.amount.cmp(&a.amount),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}

pub fn total<'a, I>(expenses: I) -> Money
where
    I: IntoIterator<Item = &'a Expense>,
{
    expenses.into_iter().map(|e| e.amount).sum()
}
