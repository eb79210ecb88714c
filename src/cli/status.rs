use colored::Colorize;

use crate::cli::open_store;
use crate::error::Result;
use crate::settings::{db_path, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let path = db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", path.display());

    if !path.exists() {
        println!();
        println!("{}", "Database not found. Run `billmatch init` to set up.".yellow());
        return Ok(());
    }

    let store = open_store()?;
    let counts = store.counts()?;
    println!();
    println!("Uploads:       {}", counts.uploads);
    println!("Transactions:  {}", counts.transactions);
    println!("Bills:         {} ({} linked)", counts.bills, counts.linked_bills);
    println!("Invoices:      {} ({} linked)", counts.invoices, counts.linked_invoices);
    store.close()
}
