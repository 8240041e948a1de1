use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::expense::Expense;
use crate::money::Money;
use crate::period::Month;

/// How many trailing months the monthly series keeps.
pub const MONTHLY_WINDOW: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: Month,
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Money,
}

/// Dashboard summary over a set of expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub total: Money,
    pub this_month: Money,
    pub average: Money,
    pub count: usize,
    /// Chronological, at most [`MONTHLY_WINDOW`] entries.
    pub monthly: Vec<MonthlyTotal>,
    /// In the order each category is first seen.
    pub by_category: Vec<CategoryTotal>,
}

impl ExpenseStats {
    pub fn compute(expenses: &[Expense], today: NaiveDate) -> Self {
        let total: Money = expenses.iter().map(|e| e.amount).sum();
        let current = Month::of(today);
        let this_month: Money = expenses
            .iter()
            .filter(|e| Month::of(e.date) == current)
            .map(|e| e.amount)
            .sum();

        let mut per_month: BTreeMap<Month, Money> = BTreeMap::new();
        for e in expenses {
            let slot = per_month.entry(Month::of(e.date)).or_insert_with(Money::zero);
            *slot = *slot + e.amount;
        }
        let skip = per_month.len().saturating_sub(MONTHLY_WINDOW);
        let monthly = per_month
            .into_iter()
            .skip(skip)
            .map(|(month, amount)| MonthlyTotal {
                month,
                label: month.label(),
                amount,
            })
            .collect();

        let mut by_category: Vec<CategoryTotal> = Vec::new();
        for e in expenses {
            match by_category.iter_mut().find(|c| c.category == e.category) {
                Some(c) => c.amount = c.amount + e.amount,
                None => by_category.push(CategoryTotal {
                    category: e.category.clone(),
                    amount: e.amount,
                }),
            }
        }

        ExpenseStats {
            total,
            this_month,
            average: Money::average(total, expenses.len()),
            count: expenses.len(),
            monthly,
            by_category,
        }
    }
}
