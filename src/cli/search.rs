use comfy_table::{Cell, Table};

use crate::cli::{amount_cell, date_cell, open_store, print_json};
use crate::error::Result;
use crate::models::{Record, RecordKind};

pub fn run(query: Option<&str>, kind: RecordKind, json: bool) -> Result<()> {
    let store = open_store()?;
    let results = store.search(kind, query)?;

    if json {
        print_json(&results)?;
    } else {
        println!("{}", format_results(kind, &results));
    }
    store.close()
}

pub fn format_results(kind: RecordKind, results: &[Record]) -> String {
    if results.is_empty() {
        return "No matching records.".to_string();
    }
    let mut table = Table::new();
    match kind {
        RecordKind::Transaction => {
            table.set_header(vec!["ID", "Number", "Date", "Amount", "Description"]);
        }
        RecordKind::Bill | RecordKind::Invoice => {
            table.set_header(vec!["ID", "Number", "Date", "Amount", "Linked Txn"]);
        }
    }
    for record in results {
        match record {
            Record::Transaction(t) => table.add_row(vec![
                Cell::new(t.id),
                Cell::new(&t.transaction_number),
                Cell::new(date_cell(&t.date)),
                Cell::new(amount_cell(t.amount)),
                Cell::new(&t.description),
            ]),
            Record::Bill(d) | Record::Invoice(d) => table.add_row(vec![
                Cell::new(d.id),
                Cell::new(&d.number),
                Cell::new(date_cell(&d.date)),
                Cell::new(amount_cell(d.amount)),
                Cell::new(
                    d.linked_transaction_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]),
        };
    }
    format!("{} result(s)\n{table}", results.len())
}
