pub mod category;
pub mod expense;
pub mod money;
pub mod period;
pub mod query;
pub mod stats;

pub use category::{Category, CategoryConfig, CategoryConfigError, DEFAULT_CATEGORIES, DEFAULT_CATEGORY_COLOR};
pub use expense::{Expense, ExpenseError, ExpenseId, NewExpense};
pub use money::{Money, MoneyParseError};
pub use period::{DateRange, Month};
pub use query::{ExpenseQuery, SortKey};
pub use stats::{CategoryTotal, ExpenseStats, MonthlyTotal};
