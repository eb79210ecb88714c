use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillmatchError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation not valid for {0} records")]
    InvalidKind(&'static str),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, BillmatchError>;
