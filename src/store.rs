use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::db::{get_connection, init_db};
use crate::error::{BillmatchError, Result};
use crate::linker::LinkPair;
use crate::models::{CanonicalRecord, Document, Record, RecordKind, Transaction, UploadRecord};

/// Durable record store over one SQLite database.
///
/// Scans return rows in insertion (id) order; the linker's first-match
/// tie-break depends on that.
pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCounts {
    pub transactions: i64,
    pub bills: i64,
    pub invoices: i64,
    pub linked_bills: i64,
    pub linked_invoices: i64,
    pub uploads: i64,
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_number: row.get(1)?,
        date: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
    })
}

fn document_from_row(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        number: row.get(1)?,
        date: row.get(2)?,
        amount: row.get(3)?,
        linked_transaction_id: row.get(4)?,
    })
}

fn document_columns(kind: RecordKind) -> String {
    format!(
        "id, {}, date, amount, linked_transaction_id",
        kind.number_column()
    )
}

const TRANSACTION_COLUMNS: &str = "id, transaction_number, date, amount, description";

fn insert_record(conn: &Connection, record: &CanonicalRecord) -> Result<i64> {
    match record {
        CanonicalRecord::Transaction(t) => {
            conn.execute(
                "INSERT INTO bank_transactions (transaction_number, date, amount, description) VALUES (?1, ?2, ?3, ?4)",
                params![t.transaction_number, t.date, t.amount, t.description],
            )?;
        }
        CanonicalRecord::Bill(d) | CanonicalRecord::Invoice(d) => {
            let kind = record.kind();
            let sql = format!(
                "INSERT INTO {} ({}, date, amount) VALUES (?1, ?2, ?3)",
                kind.table(),
                kind.number_column()
            );
            conn.execute(&sql, params![d.number, d.date, d.amount])?;
        }
    }
    Ok(conn.last_insert_rowid())
}

/// Escape LIKE wildcards so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn require_candidate(kind: RecordKind) -> Result<()> {
    if kind.is_candidate() {
        Ok(())
    } else {
        Err(BillmatchError::InvalidKind("transaction"))
    }
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        debug!(path = %db_path.display(), "store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| BillmatchError::Db(e))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub fn append(&self, record: &CanonicalRecord) -> Result<i64> {
        insert_record(&self.conn, record)
    }

    /// Append a batch atomically: either every record is stored or none is.
    pub fn append_all(&self, records: &[CanonicalRecord]) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = records
            .iter()
            .map(|r| insert_record(&tx, r))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
    }

    /// Append an uploaded file's records and its ledger entry in one
    /// transaction.
    pub fn append_upload(&self, upload: &UploadRecord, records: &[CanonicalRecord]) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = records
            .iter()
            .map(|r| insert_record(&tx, r))
            .collect::<Result<Vec<_>>>()?;
        tx.execute(
            "INSERT INTO uploads (filename, kind, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
            params![upload.filename, upload.kind.key(), ids.len() as i64, upload.checksum],
        )?;
        tx.commit()?;
        info!(file = %upload.filename, kind = %upload.kind, records = ids.len(), "upload stored");
        Ok(ids)
    }

    /// Point a bill or invoice at a transaction. Only `linked_transaction_id`
    /// changes.
    pub fn set_link(&self, kind: RecordKind, id: i64, transaction_id: i64) -> Result<()> {
        require_candidate(kind)?;
        let sql = format!(
            "UPDATE {} SET linked_transaction_id = ?1 WHERE id = ?2",
            kind.table()
        );
        self.conn.execute(&sql, params![transaction_id, id])?;
        Ok(())
    }

    /// Replace every link of `kind` with `pairs`. Runs in one transaction so
    /// a failure keeps the previous links.
    pub fn write_links(&self, kind: RecordKind, pairs: &[LinkPair]) -> Result<()> {
        require_candidate(kind)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("UPDATE {} SET linked_transaction_id = NULL", kind.table()),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&format!(
                "UPDATE {} SET linked_transaction_id = ?1 WHERE id = ?2",
                kind.table()
            ))?;
            for pair in pairs {
                stmt.execute(params![pair.transaction_id, pair.candidate_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM bank_transactions WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, [id], transaction_from_row)
            .optional()?)
    }

    pub fn get_document(&self, kind: RecordKind, id: i64) -> Result<Option<Document>> {
        require_candidate(kind)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            document_columns(kind),
            kind.table()
        );
        Ok(self.conn.query_row(&sql, [id], document_from_row).optional()?)
    }

    pub fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Record>> {
        Ok(match kind {
            RecordKind::Transaction => self.get_transaction(id)?.map(Record::Transaction),
            RecordKind::Bill => self.get_document(kind, id)?.map(Record::Bill),
            RecordKind::Invoice => self.get_document(kind, id)?.map(Record::Invoice),
        })
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM bank_transactions ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn documents(&self, kind: RecordKind) -> Result<Vec<Document>> {
        require_candidate(kind)?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            document_columns(kind),
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], document_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn scan(&self, kind: RecordKind) -> Result<Vec<Record>> {
        Ok(match kind {
            RecordKind::Transaction => self
                .transactions()?
                .into_iter()
                .map(Record::Transaction)
                .collect(),
            RecordKind::Bill => self.documents(kind)?.into_iter().map(Record::Bill).collect(),
            RecordKind::Invoice => self.documents(kind)?.into_iter().map(Record::Invoice).collect(),
        })
    }

    /// Case-insensitive substring search over the kind's identifying fields:
    /// number, date and description for transactions; number and date for
    /// bills and invoices. A blank query returns the full scan.
    pub fn search(&self, kind: RecordKind, query: Option<&str>) -> Result<Vec<Record>> {
        let query = query.map(str::trim).unwrap_or("");
        if query.is_empty() {
            return self.scan(kind);
        }
        let pattern = like_pattern(query);
        match kind {
            RecordKind::Transaction => {
                let sql = format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM bank_transactions \
                     WHERE transaction_number LIKE ?1 ESCAPE '\\' \
                        OR COALESCE(date, '') LIKE ?1 ESCAPE '\\' \
                        OR description LIKE ?1 ESCAPE '\\' \
                     ORDER BY id"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([&pattern], transaction_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows.into_iter().map(Record::Transaction).collect())
            }
            RecordKind::Bill | RecordKind::Invoice => {
                let sql = format!(
                    "SELECT {} FROM {} \
                     WHERE {} LIKE ?1 ESCAPE '\\' \
                        OR COALESCE(date, '') LIKE ?1 ESCAPE '\\' \
                     ORDER BY id",
                    document_columns(kind),
                    kind.table(),
                    kind.number_column()
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([&pattern], document_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows
                    .into_iter()
                    .map(|d| {
                        if kind == RecordKind::Bill {
                            Record::Bill(d)
                        } else {
                            Record::Invoice(d)
                        }
                    })
                    .collect())
            }
        }
    }

    pub fn upload_exists(&self, checksum: &str, kind: RecordKind) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM uploads WHERE checksum = ?1 AND kind = ?2")?;
        Ok(stmt.exists(params![checksum, kind.key()])?)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let count = |sql: &str| -> Result<i64> { Ok(self.conn.query_row(sql, [], |r| r.get(0))?) };
        Ok(StoreCounts {
            transactions: count("SELECT count(*) FROM bank_transactions")?,
            bills: count("SELECT count(*) FROM bills")?,
            invoices: count("SELECT count(*) FROM invoices")?,
            linked_bills: count("SELECT count(*) FROM bills WHERE linked_transaction_id IS NOT NULL")?,
            linked_invoices: count(
                "SELECT count(*) FROM invoices WHERE linked_transaction_id IS NOT NULL",
            )?,
            uploads: count("SELECT count(*) FROM uploads")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDocument, NewTransaction};

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn txn(number: &str, date: &str, amount: f64, description: &str) -> CanonicalRecord {
        CanonicalRecord::Transaction(NewTransaction {
            transaction_number: number.to_string(),
            date: Some(date.to_string()),
            amount,
            description: description.to_string(),
        })
    }

    fn bill(number: &str, date: &str, amount: f64) -> CanonicalRecord {
        CanonicalRecord::Bill(NewDocument {
            number: number.to_string(),
            date: Some(date.to_string()),
            amount,
        })
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let (_dir, store) = test_store();
        let a = store.append(&txn("T1", "2024-01-01", 10.0, "A")).unwrap();
        let b = store.append(&txn("T2", "2024-01-02", 20.0, "B")).unwrap();
        assert!(b > a);
        let c = store.append(&bill("B1", "2024-01-01", 10.0)).unwrap();
        assert_eq!(store.get_document(RecordKind::Bill, c).unwrap().unwrap().number, "B1");
    }

    #[test]
    fn test_scan_preserves_insertion_order() {
        let (_dir, store) = test_store();
        let ids = store
            .append_all(&[
                txn("T9", "2024-03-01", 1.0, "last alphabetically first"),
                txn("T1", "2024-01-01", 2.0, "first"),
                txn("T5", "2024-02-01", 3.0, "middle"),
            ])
            .unwrap();
        let scanned: Vec<i64> = store.transactions().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(scanned, ids);
        assert_eq!(store.transactions().unwrap()[0].transaction_number, "T9");
    }

    #[test]
    fn test_scan_round_trips_normalized_rows() {
        let (_dir, store) = test_store();
        let rec = CanonicalRecord::Transaction(NewTransaction {
            transaction_number: String::new(),
            date: None,
            amount: -3.5,
            description: "no date".to_string(),
        });
        store.append(&rec).unwrap();
        let t = &store.transactions().unwrap()[0];
        assert_eq!(t.date, None);
        assert_eq!(t.amount, -3.5);
        assert_eq!(t.transaction_number, "");
    }

    #[test]
    fn test_get_unknown_id_is_none() {
        let (_dir, store) = test_store();
        assert!(store.get_transaction(42).unwrap().is_none());
        assert!(store.get(RecordKind::Invoice, 42).unwrap().is_none());
    }

    #[test]
    fn test_search_transactions_by_description() {
        let (_dir, store) = test_store();
        store
            .append_all(&[
                txn("T1", "2024-01-01", -80.0, "Utility payment"),
                txn("T2", "2024-01-02", -20.0, "Coffee"),
                txn("T3", "2024-01-03", -90.0, "City utility co"),
            ])
            .unwrap();
        let found = store.search(RecordKind::Transaction, Some("Utility")).unwrap();
        let ids: Vec<i64> = found.iter().map(Record::id).collect();
        // LIKE folds ASCII case, so "utility" matches too.
        assert_eq!(ids.len(), 2);
        for rec in &found {
            let Record::Transaction(t) = rec else { panic!("expected transaction") };
            assert!(t.description.to_lowercase().contains("utility"));
        }
    }

    #[test]
    fn test_search_matches_date_and_number() {
        let (_dir, store) = test_store();
        store.append(&bill("B100", "2024-01-05", 150.0)).unwrap();
        store.append(&bill("B200", "2024-02-05", 75.0)).unwrap();
        assert_eq!(store.search(RecordKind::Bill, Some("b1")).unwrap().len(), 1);
        assert_eq!(store.search(RecordKind::Bill, Some("2024-02")).unwrap().len(), 1);
        assert_eq!(store.search(RecordKind::Bill, Some("")).unwrap().len(), 2);
        assert_eq!(store.search(RecordKind::Bill, None).unwrap().len(), 2);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (_dir, store) = test_store();
        store.append(&txn("T1", "2024-01-01", 1.0, "100% refund")).unwrap();
        store.append(&txn("T2", "2024-01-01", 1.0, "1000 refund")).unwrap();
        assert_eq!(store.search(RecordKind::Transaction, Some("100%")).unwrap().len(), 1);
    }

    #[test]
    fn test_set_link_rejects_transaction_kind() {
        let (_dir, store) = test_store();
        let t = store.append(&txn("T1", "2024-01-01", 1.0, "x")).unwrap();
        assert!(store.set_link(RecordKind::Transaction, t, t).is_err());
    }

    #[test]
    fn test_set_link_rejects_dangling_transaction() {
        let (_dir, store) = test_store();
        let b = store.append(&bill("B1", "2024-01-01", 1.0)).unwrap();
        assert!(store.set_link(RecordKind::Bill, b, 999).is_err());
        assert_eq!(
            store.get_document(RecordKind::Bill, b).unwrap().unwrap().linked_transaction_id,
            None
        );
    }

    #[test]
    fn test_write_links_replaces_previous_links() {
        let (_dir, store) = test_store();
        let t1 = store.append(&txn("T1", "2024-01-01", 1.0, "x")).unwrap();
        let t2 = store.append(&txn("T2", "2024-01-01", 1.0, "y")).unwrap();
        let b1 = store.append(&bill("B1", "2024-01-01", 1.0)).unwrap();
        let b2 = store.append(&bill("B2", "2024-01-01", 1.0)).unwrap();
        store.set_link(RecordKind::Bill, b1, t1).unwrap();
        store.set_link(RecordKind::Bill, b2, t1).unwrap();
        store
            .write_links(RecordKind::Bill, &[LinkPair { candidate_id: b1, transaction_id: t2 }])
            .unwrap();
        let docs = store.documents(RecordKind::Bill).unwrap();
        assert_eq!(docs[0].linked_transaction_id, Some(t2));
        assert_eq!(docs[1].linked_transaction_id, None);
    }

    #[test]
    fn test_append_upload_is_atomic_with_ledger() {
        let (_dir, store) = test_store();
        let upload = UploadRecord {
            filename: "bills.csv".to_string(),
            kind: RecordKind::Bill,
            checksum: "abc".to_string(),
        };
        store.append_upload(&upload, &[bill("B1", "2024-01-01", 5.0)]).unwrap();
        assert!(store.upload_exists("abc", RecordKind::Bill).unwrap());
        assert!(!store.upload_exists("abc", RecordKind::Invoice).unwrap());
        let counts = store.counts().unwrap();
        assert_eq!(counts.bills, 1);
        assert_eq!(counts.uploads, 1);
    }

    #[test]
    fn test_close_releases_connection() {
        let (dir, store) = test_store();
        store.append(&txn("T1", "2024-01-01", 1.0, "x")).unwrap();
        store.close().unwrap();
        let reopened = Store::open(&dir.path().join("test.db")).unwrap();
        assert_eq!(reopened.transactions().unwrap().len(), 1);
    }
}
