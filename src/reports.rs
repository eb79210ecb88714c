use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::linker::Linkable;
use crate::models::{Document, RecordKind, Transaction};
use crate::store::Store;

// ---------------------------------------------------------------------------
// Linked bills / invoices
// ---------------------------------------------------------------------------

/// A bill or invoice joined with the transaction that settles it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedDocument {
    pub id: i64,
    pub number: String,
    pub date: Option<String>,
    pub amount: f64,
    pub linked_transaction: Transaction,
}

pub fn linked_bills(store: &Store) -> Result<Vec<LinkedDocument>> {
    linked_documents(store, RecordKind::Bill)
}

pub fn linked_invoices(store: &Store) -> Result<Vec<LinkedDocument>> {
    linked_documents(store, RecordKind::Invoice)
}

fn linked_documents(store: &Store, kind: RecordKind) -> Result<Vec<LinkedDocument>> {
    let transactions = transactions_by_id(store)?;
    Ok(store
        .documents(kind)?
        .into_iter()
        .filter(|d| d.is_linkable())
        .filter_map(|d| {
            let txn = d.linked_transaction_id.and_then(|id| transactions.get(&id))?;
            Some(LinkedDocument {
                id: d.id,
                number: d.number,
                date: d.date,
                amount: d.amount,
                linked_transaction: txn.clone(),
            })
        })
        .collect())
}

fn transactions_by_id(store: &Store) -> Result<HashMap<i64, Transaction>> {
    Ok(store
        .transactions()?
        .into_iter()
        .map(|t| (t.id, t))
        .collect())
}

// ---------------------------------------------------------------------------
// Transactions with children
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionWithChildren {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub bills: Vec<Document>,
    pub invoices: Vec<Document>,
}

fn children_by_transaction(store: &Store, kind: RecordKind) -> Result<HashMap<i64, Vec<Document>>> {
    let mut grouped: HashMap<i64, Vec<Document>> = HashMap::new();
    for doc in store.documents(kind)? {
        if !doc.is_linkable() {
            continue;
        }
        if let Some(txn_id) = doc.linked_transaction_id {
            grouped.entry(txn_id).or_default().push(doc);
        }
    }
    Ok(grouped)
}

/// Every valid transaction, linked or not, with the bills and invoices that
/// point at it. Children keep store order.
pub fn transactions_with_children(store: &Store) -> Result<Vec<TransactionWithChildren>> {
    let mut bills = children_by_transaction(store, RecordKind::Bill)?;
    let mut invoices = children_by_transaction(store, RecordKind::Invoice)?;
    Ok(store
        .transactions()?
        .into_iter()
        .filter(|t| t.is_linkable())
        .map(|t| TransactionWithChildren {
            bills: bills.remove(&t.id).unwrap_or_default(),
            invoices: invoices.remove(&t.id).unwrap_or_default(),
            transaction: t,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Combined report
// ---------------------------------------------------------------------------

/// All three views together, as returned after a linking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    pub transactions: Vec<TransactionWithChildren>,
    pub bills: Vec<LinkedDocument>,
    pub invoices: Vec<LinkedDocument>,
}

pub fn link_report(store: &Store) -> Result<LinkReport> {
    Ok(LinkReport {
        transactions: transactions_with_children(store)?,
        bills: linked_bills(store)?,
        invoices: linked_invoices(store)?,
    })
}
