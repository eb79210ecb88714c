use crate::cli::search::format_results;
use crate::cli::{open_store, print_json};
use crate::error::Result;
use crate::models::RecordKind;

pub fn run(kind: RecordKind, id: i64, json: bool) -> Result<()> {
    let store = open_store()?;
    match store.get(kind, id)? {
        Some(record) if json => print_json(&record)?,
        Some(record) => println!("{}", format_results(kind, &[record])),
        None => println!("No {kind} with id {id}."),
    }
    store.close()
}
