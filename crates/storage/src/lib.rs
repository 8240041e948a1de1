pub mod db;
pub mod files;

use spendlens_core::Money;
use thiserror::Error;

pub use db::{
    create_db, create_in_memory, delete_expense, get_expense, insert_expense, list_categories,
    query_expenses, seed_categories, DbPool,
};
pub use files::ReceiptStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Corrupt receipt data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Amount does not fit in storage: {0}")]
    AmountOutOfRange(Money),
}
