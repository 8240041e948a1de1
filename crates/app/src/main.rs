use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{AddArgs, AppContext, ListArgs};
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "spendlens", version, about = "Expense tracking with receipt scanning")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fields found in a receipt's OCR text as JSON
    Extract {
        /// Text file, or `-` for stdin
        input: PathBuf,
    },

    /// Record an expense, optionally prefilled from a receipt
    Add(AddArgs),

    /// List expenses
    List(ListArgs),

    /// Delete an expense by id
    Delete { id: i64 },

    /// Dashboard summary as JSON
    Stats,

    /// Show the configured categories
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Extraction is pure; it needs neither config nor storage.
    if let Command::Extract { input } = &cli.command {
        let receipt = commands::extract(input)?;
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let ctx = AppContext::open(&config).await?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Extract { .. } => unreachable!("handled above"),

        Command::Add(args) => {
            let expense = commands::add(&ctx, args, today).await?;
            println!("{}", serde_json::to_string_pretty(&expense)?);
        }

        Command::List(args) => {
            let listing = commands::list(&ctx, args).await?;
            for e in &listing.expenses {
                println!(
                    "{:>5}  {}  {:>10}  {:<18}  {}",
                    e.id, e.date, e.amount.to_string(), e.category, e.title
                );
            }
            println!("Total ({} expenses): {}", listing.expenses.len(), listing.total);
        }

        Command::Delete { id } => {
            commands::delete(&ctx, id).await?;
            println!("Deleted expense {id}");
        }

        Command::Stats => {
            let stats = commands::stats(&ctx, today).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Command::Categories => {
            for c in commands::categories(&ctx).await? {
                println!("{}  {}", c.color, c.name);
            }
        }
    }

    ctx.db.close().await;
    Ok(())
}
