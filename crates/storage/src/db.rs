use chrono::{NaiveDate, NaiveDateTime};
use spendlens_core::{Category, CategoryConfig, DateRange, Expense, ExpenseId, Money, NewExpense};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

use crate::StorageError;

pub type DbPool = Pool<Sqlite>;

type ExpenseRow = (
    i64,
    String,
    i64,
    String,
    NaiveDate,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<NaiveDateTime>,
);

const EXPENSE_COLUMNS: &str =
    "id, title, amount_cents, category, date, description, receipt_url, receipt_data, created_at";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
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

/// A private database that lives as long as the pool. Used by tests.
pub async fn create_in_memory() -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT,
            receipt_url TEXT,
            receipt_data TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)")
        .execute(pool)
        .await?;

    Ok(())
}

// ── Categories ────────────────────────────────────────────────────────────────

/// Insert every configured category that is not stored yet. Existing rows
/// keep their color.
pub async fn seed_categories(pool: &DbPool, config: &CategoryConfig) -> Result<(), sqlx::Error> {
    for category in config.categories() {
        sqlx::query("INSERT OR IGNORE INTO categories (name, color) VALUES (?, ?)")
            .bind(&category.name)
            .bind(&category.color)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn list_categories(pool: &DbPool) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT name, color FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, color)| Category { name, color })
        .collect())
}

// ── Expenses ──────────────────────────────────────────────────────────────────

pub async fn insert_expense(pool: &DbPool, expense: &NewExpense) -> Result<ExpenseId, StorageError> {
    let amount_cents = expense
        .amount
        .to_cents()
        .ok_or(StorageError::AmountOutOfRange(expense.amount))?;
    let receipt_data = expense
        .receipt_data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        "INSERT INTO expenses (title, amount_cents, category, date, description, receipt_url, receipt_data) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&expense.title)
    .bind(amount_cents)
    .bind(&expense.category)
    .bind(expense.date)
    .bind(&expense.description)
    .bind(&expense.receipt_url)
    .bind(receipt_data)
    .execute(pool)
    .await?;

    let id = ExpenseId(result.last_insert_rowid());
    tracing::info!(%id, title = %expense.title, amount = %expense.amount, "expense stored");
    Ok(id)
}

pub async fn get_expense(pool: &DbPool, id: ExpenseId) -> Result<Option<Expense>, StorageError> {
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?");
    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    row.map(expense_from_row).transpose()
}

/// Newest first; ties broken by most recently inserted.
pub async fn query_expenses(
    pool: &DbPool,
    range: Option<DateRange>,
) -> Result<Vec<Expense>, StorageError> {
    let rows = match range {
        Some(r) => {
            let sql = format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE date >= ? AND date <= ? ORDER BY date DESC, id DESC"
            );
            sqlx::query_as::<_, ExpenseRow>(&sql)
                .bind(r.start)
                .bind(r.end)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, id DESC");
            sqlx::query_as::<_, ExpenseRow>(&sql).fetch_all(pool).await?
        }
    };

    rows.into_iter().map(expense_from_row).collect()
}

/// Returns whether a row was removed.
pub async fn delete_expense(pool: &DbPool, id: ExpenseId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn expense_from_row(r: ExpenseRow) -> Result<Expense, StorageError> {
    let receipt_data = r.7.as_deref().map(serde_json::from_str::<serde_json::Value>).transpose()?;
    Ok(Expense {
        id: ExpenseId(r.0),
        title: r.1,
        amount: Money::from_cents(r.2),
        category: r.3,
        date: r.4,
        description: r.5,
        receipt_url: r.6,
        receipt_data,
        created_at: r.8.map(|t| t.and_utc()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(title: &str, cents: i64, on: NaiveDate) -> NewExpense {
        NewExpense::new(title, Money::from_cents(cents), "Food & Dining", on)
    }

    #[tokio::test]
    async fn insert_then_get_roundtrips_fields() {
        let pool = create_in_memory().await.unwrap();
        let mut e = expense("ACME MART", 1150, date(2024, 3, 14));
        e.description = Some("milk, bread".to_string());
        e.receipt_url = Some("file:///tmp/r.png".to_string());
        e.receipt_data = Some(serde_json::json!({ "amount": "11.5", "items": ["milk"] }));

        let id = insert_expense(&pool, &e).await.unwrap();
        let stored = get_expense(&pool, id).await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "ACME MART");
        assert_eq!(stored.amount, Money::from_cents(1150));
        assert_eq!(stored.date, date(2024, 3, 14));
        assert_eq!(stored.description.as_deref(), Some("milk, bread"));
        assert_eq!(stored.receipt_url.as_deref(), Some("file:///tmp/r.png"));
        assert_eq!(stored.receipt_data.unwrap()["amount"], "11.5");
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn insert_rejects_amount_beyond_cents_range() {
        let pool = create_in_memory().await.unwrap();
        let mut e = expense("huge", 100, date(2024, 1, 1));
        e.amount = "900000000000000000000000000".parse().unwrap();
        let err = insert_expense(&pool, &e).await.unwrap_err();
        assert!(matches!(err, StorageError::AmountOutOfRange(_)), "{err:?}");
        assert!(query_expenses(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_expense_is_none() {
        let pool = create_in_memory().await.unwrap();
        assert!(get_expense(&pool, ExpenseId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_orders_newest_first_and_filters_by_range() {
        let pool = create_in_memory().await.unwrap();
        insert_expense(&pool, &expense("old", 100, date(2023, 12, 31))).await.unwrap();
        insert_expense(&pool, &expense("mid", 200, date(2024, 1, 15))).await.unwrap();
        insert_expense(&pool, &expense("new", 300, date(2024, 2, 1))).await.unwrap();

        let all = query_expenses(&pool, None).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);

        let january = DateRange::new(date(2024, 1, 1), date(2024, 1, 31));
        let in_jan = query_expenses(&pool, Some(january)).await.unwrap();
        assert_eq!(in_jan.len(), 1);
        assert_eq!(in_jan[0].title, "mid");
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let pool = create_in_memory().await.unwrap();
        let id = insert_expense(&pool, &expense("gone", 100, date(2024, 1, 1))).await.unwrap();

        assert!(delete_expense(&pool, id).await.unwrap());
        assert!(!delete_expense(&pool, id).await.unwrap());
        assert!(query_expenses(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_categories_is_idempotent_and_sorted() {
        let pool = create_in_memory().await.unwrap();
        let config = CategoryConfig::default();
        seed_categories(&pool, &config).await.unwrap();
        seed_categories(&pool, &config).await.unwrap();

        let cats = list_categories(&pool).await.unwrap();
        assert_eq!(cats.len(), config.categories().len());
        assert_eq!(cats[0].name, "Bills & Utilities");
        assert!(cats.iter().any(|c| c.name == "Travel" && c.color == "#F97316"));
    }

    #[tokio::test]
    async fn create_db_on_disk_persists_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");

        let pool = create_db(&path).await.unwrap();
        insert_expense(&pool, &expense("kept", 500, date(2024, 5, 5))).await.unwrap();
        pool.close().await;

        let pool = create_db(&path).await.unwrap();
        let all = query_expenses(&pool, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "kept");
    }
}
