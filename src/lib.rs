//! Record linking for bank reconciliation: ingest bank statement lines,
//! bills and invoices, match each bill or invoice to the transaction that
//! settles it, and project the linked views.

pub mod cli;
pub mod db;
pub mod error;
pub mod importer;
pub mod linker;
pub mod models;
pub mod normalizer;
pub mod reports;
pub mod settings;
pub mod store;

pub use error::{BillmatchError, Result};
pub use linker::{link, run_linking, ExactMatch, LinkPair, LinkStrategy, LinkSummary};
pub use models::{CanonicalRecord, Document, RawRow, Record, RecordKind, Transaction};
pub use store::Store;
