pub mod init;
pub mod link;
pub mod load;
pub mod report;
pub mod search;
pub mod show;
pub mod status;
pub mod upload;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::error::{BillmatchError, Result};
use crate::models::RecordKind;
use crate::settings::db_path;
use crate::store::Store;

/// Open the configured store, refusing to create one implicitly.
pub(crate) fn open_store() -> Result<Store> {
    let path = db_path();
    if !path.exists() {
        return Err(BillmatchError::Settings(format!(
            "No database found at {}\nRun `billmatch init` to create one.",
            path.display()
        )));
    }
    Store::open(&path)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn date_cell(date: &Option<String>) -> String {
    date.clone().unwrap_or_else(|| "-".to_string())
}

pub(crate) fn amount_cell(amount: f64) -> String {
    format!("{amount:.2}")
}

#[derive(Parser)]
#[command(
    name = "billmatch",
    about = "Link bank statement transactions to the bills and invoices they settle."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for billmatch data (default: ~/Documents/billmatch)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Ingest bank statements, bills or invoices (CSV, XLSX or TXT).
    Upload {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<String>,
        /// Record kind contained in the files: bank, bill, invoice
        #[arg(long, value_enum)]
        kind: RecordKind,
    },
    /// Recompute bill and invoice links, then print the link report.
    Link {
        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Search records by number, date or description (case-insensitive).
    Search {
        /// Text to look for; omit to list everything
        query: Option<String>,
        /// Record kind to search: transaction, bill, invoice
        #[arg(long, value_enum, default_value = "transaction")]
        kind: RecordKind,
        #[arg(long)]
        json: bool,
    },
    /// Show the linked views without re-linking.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show one record by id.
    Show {
        #[arg(value_enum)]
        kind: RecordKind,
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Switch to an existing billmatch data directory.
    Load {
        /// Path to data directory containing billmatch.db
        path: String,
    },
    /// Show current database and record counts.
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Bills joined with the transaction that settles them.
    Bills {
        #[arg(long)]
        json: bool,
    },
    /// Invoices joined with the transaction that settles them.
    Invoices {
        #[arg(long)]
        json: bool,
    },
    /// Every transaction with its linked bills and invoices.
    Transactions {
        #[arg(long)]
        json: bool,
    },
}
