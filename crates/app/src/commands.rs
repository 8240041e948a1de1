use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use spendlens_core::{
    Category, CategoryConfig, Expense, ExpenseId, ExpenseQuery, ExpenseStats, Money, Month,
    SortKey,
};
use spendlens_ocr::{default_backend, ExpenseDraft, ReceiptScanner, ScanOutcome, ScannedReceipt};
use spendlens_storage::{DbPool, ReceiptStore};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;

/// Everything a command needs: storage, file store, categories and OCR.
pub struct AppContext {
    pub db: DbPool,
    pub store: ReceiptStore,
    pub categories: CategoryConfig,
    pub scanner: ReceiptScanner,
}

impl AppContext {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let db_path = data_dir.join("expenses.db");
        let db = spendlens_storage::create_db(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let categories = config.category_config()?;
        spendlens_storage::seed_categories(&db, &categories)
            .await
            .context("Failed to seed categories")?;

        let files_root = data_dir.join("files");
        let store = ReceiptStore::new(files_root.clone(), config.public_base_url(&files_root));
        let scanner = ReceiptScanner::new(Arc::from(default_backend(&config.ocr_lang)))
            .with_timeout(config.ocr_timeout());

        tracing::debug!(data_dir = %data_dir.display(), "context ready");
        Ok(Self { db, store, categories, scanner })
    }
}

/// Read a whole file, or stdin when `path` is `-`.
pub fn read_text_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

// ── extract ───────────────────────────────────────────────────────────────────

pub fn extract(input: &Path) -> Result<ScannedReceipt> {
    let text = read_text_input(input)?;
    Ok(ReceiptScanner::scan_text(&text).receipt)
}

// ── add ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct AddArgs {
    /// OCR text of the receipt (`-` for stdin); skips recognition
    #[arg(long)]
    pub receipt_text: Option<PathBuf>,

    /// Receipt image to upload (and recognize when no text is given)
    #[arg(long)]
    pub image: Option<PathBuf>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub amount: Option<Money>,

    /// YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

pub async fn add(ctx: &AppContext, args: AddArgs, today: NaiveDate) -> Result<Expense> {
    let scan = scan_for_add(ctx, &args).await?;
    let mut draft = match &scan {
        Some(outcome) => ExpenseDraft::from_scan(&outcome.receipt, today),
        None => ExpenseDraft::blank(today),
    };

    if let Some(title) = args.title {
        draft = draft.with_title(title);
    }
    if let Some(amount) = args.amount {
        draft = draft.with_amount(amount);
    }
    if let Some(date) = args.date {
        draft = draft.with_date(date);
    }
    if let Some(category) = args.category {
        draft = draft.with_category(category);
    }
    if let Some(description) = args.description {
        draft = draft.with_description(description);
    }

    if let Some(image) = &args.image {
        match upload_image(&ctx.store, image).await {
            Ok(url) => draft = draft.with_receipt_url(url),
            Err(e) => tracing::warn!("Receipt upload failed, saving without it: {e:#}"),
        }
    }

    let new_expense = draft
        .into_new_expense(&ctx.categories)
        .context("Expense is incomplete; fill in the missing fields with flags")?;
    let id = spendlens_storage::insert_expense(&ctx.db, &new_expense).await?;
    spendlens_storage::get_expense(&ctx.db, id)
        .await?
        .with_context(|| format!("Expense {id} vanished after insert"))
}

async fn scan_for_add(ctx: &AppContext, args: &AddArgs) -> Result<Option<ScanOutcome>> {
    if let Some(path) = &args.receipt_text {
        let text = read_text_input(path)?;
        return Ok(Some(ReceiptScanner::scan_text(&text)));
    }
    let Some(image) = &args.image else {
        return Ok(None);
    };
    let outcome = ctx.scanner.scan_file(image).await?;
    if !outcome.recognized() {
        tracing::warn!("Could not read the receipt; enter the details manually");
    }
    Ok(Some(outcome))
}

async fn upload_image(store: &ReceiptStore, image: &Path) -> Result<String> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let ext = image.extension().and_then(|e| e.to_str()).unwrap_or("bin");
    let key = store.upload_file(&bytes, ext).await?;
    Ok(store.public_url(&key))
}

// ── list ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Match against title or description
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// date | amount | title
    #[arg(long, default_value = "date")]
    pub sort: SortKey,

    /// Only expenses in this month (YYYY-MM)
    #[arg(long)]
    pub month: Option<Month>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListing {
    pub expenses: Vec<Expense>,
    pub total: Money,
}

pub async fn list(ctx: &AppContext, args: ListArgs) -> Result<ExpenseListing> {
    let range = match args.month {
        Some(m) => Some(m.range().with_context(|| format!("Invalid month {m}"))?),
        None => None,
    };
    let all = spendlens_storage::query_expenses(&ctx.db, range).await?;
    let query = ExpenseQuery {
        search: args.search,
        category: args.category,
        sort: args.sort,
    };
    let expenses: Vec<Expense> = query.apply(&all).into_iter().cloned().collect();
    let total = spendlens_core::query::total(&expenses);
    Ok(ExpenseListing { expenses, total })
}

// ── delete / stats / categories ───────────────────────────────────────────────

pub async fn delete(ctx: &AppContext, id: i64) -> Result<()> {
    if !spendlens_storage::delete_expense(&ctx.db, ExpenseId(id)).await? {
        bail!("No expense with id {id}");
    }
    tracing::info!(id, "expense deleted");
    Ok(())
}

pub async fn stats(ctx: &AppContext, today: NaiveDate) -> Result<ExpenseStats> {
    let all = spendlens_storage::query_expenses(&ctx.db, None).await?;
    Ok(ExpenseStats::compute(&all, today))
}

pub async fn categories(ctx: &AppContext) -> Result<Vec<Category>> {
    Ok(spendlens_storage::list_categories(&ctx.db).await?)
}
