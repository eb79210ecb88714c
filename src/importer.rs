use std::path::Path;

use regex::{Regex, RegexBuilder};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{RawRow, RecordKind, UploadRecord};
use crate::normalizer::normalize_rows;
use crate::store::Store;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn extension(file_path: &Path) -> String {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Source formats — enum dispatch on file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Spreadsheet,
    Text,
    Unsupported,
}

impl SourceFormat {
    pub fn detect(file_path: &Path) -> Self {
        match extension(file_path).as_str() {
            "csv" => Self::Csv,
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "ods" => Self::Spreadsheet,
            "txt" => Self::Text,
            _ => Self::Unsupported,
        }
    }

    pub fn read_rows(&self, file_path: &Path, kind: RecordKind) -> Result<Vec<RawRow>> {
        match self {
            Self::Csv => read_csv_rows(file_path),
            #[cfg(feature = "xlsx")]
            Self::Spreadsheet => read_spreadsheet_rows(file_path),
            Self::Text => {
                let text = std::fs::read_to_string(file_path)?;
                Ok(fields_from_text(&text, kind)?.into_iter().collect())
            }
            Self::Unsupported => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// upload_file
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct UploadResult {
    pub ingested: usize,
    pub duplicate_file: bool,
}

/// Read `file_path` as `kind` records and append them to the store. A file
/// whose checksum was already uploaded for the same kind is skipped.
pub fn upload_file(store: &Store, file_path: &Path, kind: RecordKind) -> Result<UploadResult> {
    let checksum = compute_checksum(file_path)?;
    if store.upload_exists(&checksum, kind)? {
        debug!(file = %file_path.display(), "duplicate upload skipped");
        return Ok(UploadResult {
            ingested: 0,
            duplicate_file: true,
        });
    }

    let format = SourceFormat::detect(file_path);
    let rows = format.read_rows(file_path, kind)?;
    if rows.is_empty() {
        warn!(file = %file_path.display(), ?format, "no rows extracted");
    }

    let records = normalize_rows(&rows, kind);
    let upload = UploadRecord {
        filename: file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string(),
        kind,
        checksum,
    };
    let ids = store.append_upload(&upload, &records)?;

    Ok(UploadResult {
        ingested: ids.len(),
        duplicate_file: false,
    })
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv_rows(file_path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));
    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for (line, result) in rdr.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line + 2, error = %e, "skipping unreadable CSV record");
                continue;
            }
        };
        if std::str::from_utf8(record.as_slice()).is_err() {
            debug!(line = line + 2, "non-UTF-8 bytes replaced");
        }
        rows.push(RawRow::from_pairs(headers.iter().cloned().zip(
            record.iter().map(|c| String::from_utf8_lossy(c).into_owned()),
        )));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Spreadsheet reader (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use crate::normalizer::excel_serial_to_date;
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet_rows(file_path: &Path) -> Result<Vec<RawRow>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| crate::error::BillmatchError::Spreadsheet(format!("Failed to open workbook: {e}")))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range.map_err(|e| crate::error::BillmatchError::Spreadsheet(e.to_string()))?;

    let mut iter = range.rows();
    let Some(header) = iter.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(cell_text).collect();
    Ok(iter
        .map(|row| {
            RawRow::from_pairs(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, c)| (h.clone(), cell_text(c))),
            )
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Plain-text bill/invoice documents
// ---------------------------------------------------------------------------

/// Pull one bill or invoice row out of free text. Bank statements are never
/// read from text, so `Transaction` yields `None`.
pub fn fields_from_text(text: &str, kind: RecordKind) -> Result<Option<RawRow>> {
    if !kind.is_candidate() {
        return Ok(None);
    }
    let date_re = Regex::new(r"(\d{2,4}[/-]\d{1,2}[/-]\d{1,4})")?;
    let number_re = RegexBuilder::new(r"(Bill|Invoice)[^\d]*(\d+)")
        .case_insensitive(true)
        .build()?;
    let amount_re = Regex::new(r"(?:[Rr][sS]?\.?|INR|USD|\$|₹)?\s?([\d,]+\.\d{2})")?;
    let description_re = Regex::new(r"(?:Description|For|Purpose)[:\-\s]+(.+)")?;

    let date = date_re.captures(text).map(|c| c[1].to_string());
    let number = number_re.captures(text).map(|c| c[2].to_string());
    let amount = amount_re.captures(text).map(|c| c[1].to_string());
    let description = description_re
        .captures(text)
        .map(|c| c[1].trim().to_string());

    if date.is_none() && number.is_none() && amount.is_none() {
        return Ok(None);
    }

    let mut row = RawRow::new();
    row.insert("date", date.unwrap_or_default());
    row.insert(kind.number_column(), number.unwrap_or_default());
    row.insert("amount", amount.unwrap_or_default());
    row.insert("description", description.unwrap_or_default());
    Ok(Some(row))
}
