use chrono::NaiveDate;
use tracing::debug;

use crate::models::{CanonicalRecord, NewDocument, NewTransaction, RawRow, RecordKind};

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse a raw amount cell. Non-numeric input is 0.0.
pub fn parse_amount(raw: &str) -> f64 {
    let mut s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '₹' | '€' | '£' | ' '))
        .collect();
    for word in ["INR", "USD", "Rs.", "Rs", "rs"] {
        s = s.replace(word, "");
    }
    let upper = s.to_uppercase();
    let mut sign = 1.0;
    if let Some(rest) = upper.strip_suffix("DR") {
        s = rest.to_string();
        sign = -1.0;
    } else if let Some(rest) = upper.strip_suffix("CR") {
        s = rest.to_string();
    }
    let s = s.trim();
    let value = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => -inner.trim().parse::<f64>().unwrap_or(0.0),
        None => sign * s.parse::<f64>().unwrap_or(0.0),
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse a raw date cell into `YYYY-MM-DD`; `None` marks an unparseable date.
/// Bare numbers are not dates here; spreadsheet serials are converted by the
/// importer before they reach the normalizer.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(d) = parse_date_only(raw) {
        return Some(d);
    }
    // A trailing time component, as in `2024-01-05 00:00:00` or `2024-01-05T10:30`.
    let (date_part, time_part) = raw.split_once(|c: char| c == 'T' || c == ' ')?;
    if time_part.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
        parse_date_only(date_part)
    } else {
        None
    }
}

fn parse_date_only(raw: &str) -> Option<String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Convert a spreadsheet serial day number. Values outside Excel's date range
/// are `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(chrono::Duration::days(serial as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn text(row: &RawRow, column: &str) -> String {
    row.get(column).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn document_number(row: &RawRow, kind: RecordKind) -> String {
    let primary = text(row, kind.number_column());
    if primary.is_empty() {
        text(row, "number")
    } else {
        primary
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Canonicalize one raw row for `kind`. Never fails: bad dates become `None`,
/// bad amounts become 0.0, missing text becomes "".
pub fn normalize(row: &RawRow, kind: RecordKind) -> CanonicalRecord {
    let raw_date = text(row, "date");
    let date = parse_date(&raw_date);
    if date.is_none() && !raw_date.is_empty() {
        debug!(kind = %kind, raw = %raw_date, "unparseable date");
    }
    let amount = parse_amount(&text(row, "amount"));

    match kind {
        RecordKind::Transaction => CanonicalRecord::Transaction(NewTransaction {
            transaction_number: text(row, kind.number_column()),
            date,
            amount,
            description: text(row, "description"),
        }),
        RecordKind::Bill => CanonicalRecord::Bill(NewDocument {
            number: document_number(row, kind),
            date,
            amount: amount.abs(),
        }),
        RecordKind::Invoice => CanonicalRecord::Invoice(NewDocument {
            number: document_number(row, kind),
            date,
            amount: amount.abs(),
        }),
    }
}

/// Normalize a batch. Every row yields exactly one record, in input order.
pub fn normalize_rows(rows: &[RawRow], kind: RecordKind) -> Vec<CanonicalRecord> {
    rows.iter().map(|r| normalize(r, kind)).collect()
}
