use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "billmatch.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bank_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_number TEXT NOT NULL DEFAULT '',
    date TEXT,
    amount REAL NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS bills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bill_number TEXT NOT NULL DEFAULT '',
    date TEXT,
    amount REAL NOT NULL DEFAULT 0,
    linked_transaction_id INTEGER,
    FOREIGN KEY (linked_transaction_id) REFERENCES bank_transactions(id)
);

CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_number TEXT NOT NULL DEFAULT '',
    date TEXT,
    amount REAL NOT NULL DEFAULT 0,
    linked_transaction_id INTEGER,
    FOREIGN KEY (linked_transaction_id) REFERENCES bank_transactions(id)
);

CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    kind TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    uploaded_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_bills_link ON bills(linked_transaction_id);
CREATE INDEX IF NOT EXISTS idx_invoices_link ON invoices(linked_transaction_id);
CREATE INDEX IF NOT EXISTS idx_uploads_checksum ON uploads(checksum, kind);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
