use std::path::PathBuf;

use crate::cli::open_store;
use crate::error::Result;
use crate::importer::upload_file;
use crate::models::RecordKind;

pub fn run(files: &[String], kind: RecordKind) -> Result<()> {
    let store = open_store()?;

    let mut total = 0usize;
    for file in files {
        let path = PathBuf::from(file);
        let result = upload_file(&store, &path, kind)?;
        if result.duplicate_file {
            println!("{file}: already uploaded as {kind} (duplicate checksum), skipped");
        } else {
            println!("{file}: {} ingested", result.ingested);
            total += result.ingested;
        }
    }
    if files.len() > 1 {
        println!("{total} {kind} records ingested");
    }

    store.close()
}
