use std::fmt;

use serde::Serialize;

/// The three record kinds the store keeps, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[value(alias = "bank")]
    Transaction,
    Bill,
    Invoice,
}

impl RecordKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Bill => "bill",
            Self::Invoice => "invoice",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Transaction => "bank_transactions",
            Self::Bill => "bills",
            Self::Invoice => "invoices",
        }
    }

    /// Column holding the external identifying number for this kind.
    pub fn number_column(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction_number",
            Self::Bill => "bill_number",
            Self::Invoice => "invoice_number",
        }
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, Self::Bill | Self::Invoice)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_number: String,
    pub date: Option<String>,
    pub amount: f64,
    pub description: String,
}

/// A bill or an invoice. Both kinds share this shape; the kind is carried by
/// the table the row lives in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: i64,
    pub number: String,
    pub date: Option<String>,
    pub amount: f64,
    pub linked_transaction_id: Option<i64>,
}

/// Returned by search: one stored record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Transaction(Transaction),
    Bill(Document),
    Invoice(Document),
}

impl Record {
    pub fn id(&self) -> i64 {
        match self {
            Self::Transaction(t) => t.id,
            Self::Bill(d) | Self::Invoice(d) => d.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical records (normalized, not yet stored)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_number: String,
    pub date: Option<String>,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub number: String,
    pub date: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    Transaction(NewTransaction),
    Bill(NewDocument),
    Invoice(NewDocument),
}

impl CanonicalRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Transaction(_) => RecordKind::Transaction,
            Self::Bill(_) => RecordKind::Bill,
            Self::Invoice(_) => RecordKind::Invoice,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw rows (importer output, normalizer input)
// ---------------------------------------------------------------------------

/// One extracted tabular row: column name to raw cell text, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push((column.into(), value.into()));
    }

    /// Look up a cell by canonical column name. Headers compare after
    /// trimming, lowercasing, and mapping spaces/hyphens to underscores, so
    /// `Bill Number` finds `bill_number`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| canonical_header(k) == column)
            .map(|(_, v)| v.as_str())
    }
}

pub fn canonical_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Upload ledger entry for one ingested file.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub filename: String,
    pub kind: RecordKind,
    pub checksum: String,
}
