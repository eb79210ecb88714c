use comfy_table::{Cell, Table};

use crate::cli::{amount_cell, date_cell, open_store, print_json, ReportCommands};
use crate::error::Result;
use crate::reports::{self, LinkedDocument, TransactionWithChildren};

pub fn run(command: ReportCommands) -> Result<()> {
    let store = open_store()?;
    match command {
        ReportCommands::Bills { json } => {
            let bills = reports::linked_bills(&store)?;
            if json {
                print_json(&bills)?;
            } else {
                println!("{}", format_linked("Linked bills", &bills));
            }
        }
        ReportCommands::Invoices { json } => {
            let invoices = reports::linked_invoices(&store)?;
            if json {
                print_json(&invoices)?;
            } else {
                println!("{}", format_linked("Linked invoices", &invoices));
            }
        }
        ReportCommands::Transactions { json } => {
            let view = reports::transactions_with_children(&store)?;
            if json {
                print_json(&view)?;
            } else {
                println!("{}", format_transactions(&view));
            }
        }
    }
    store.close()
}

pub fn format_linked(title: &str, docs: &[LinkedDocument]) -> String {
    if docs.is_empty() {
        return format!("{title}\n  (none)");
    }
    let mut table = Table::new();
    table.set_header(vec!["Number", "Date", "Amount", "Txn ID", "Txn Number", "Txn Description"]);
    for doc in docs {
        let txn = &doc.linked_transaction;
        table.add_row(vec![
            Cell::new(&doc.number),
            Cell::new(date_cell(&doc.date)),
            Cell::new(amount_cell(doc.amount)),
            Cell::new(txn.id),
            Cell::new(&txn.transaction_number),
            Cell::new(&txn.description),
        ]);
    }
    format!("{title}\n{table}")
}

fn children_cell(docs: &[crate::models::Document]) -> String {
    docs.iter()
        .map(|d| format!("{} ({}, {})", d.number, date_cell(&d.date), amount_cell(d.amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_transactions(view: &[TransactionWithChildren]) -> String {
    if view.is_empty() {
        return "Transactions\n  (none)".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Number", "Date", "Amount", "Description", "Bills", "Invoices"]);
    for row in view {
        let t = &row.transaction;
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.transaction_number),
            Cell::new(date_cell(&t.date)),
            Cell::new(amount_cell(t.amount)),
            Cell::new(&t.description),
            Cell::new(children_cell(&row.bills)),
            Cell::new(children_cell(&row.invoices)),
        ]);
    }
    format!("Transactions\n{table}")
}
