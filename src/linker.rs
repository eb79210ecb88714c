use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Document, RecordKind, Transaction};
use crate::store::Store;

/// One association produced by a linking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkPair {
    pub candidate_id: i64,
    pub transaction_id: i64,
}

/// Records with a blank number or a zero/negative amount never take part in
/// linking or in the linked views.
pub trait Linkable {
    fn is_linkable(&self) -> bool;
}

impl Linkable for Transaction {
    fn is_linkable(&self) -> bool {
        // Debits are stored negative and still settle bills.
        !self.transaction_number.trim().is_empty() && self.amount.abs() > 0.0
    }
}

impl Linkable for Document {
    fn is_linkable(&self) -> bool {
        !self.number.trim().is_empty() && self.amount > 0.0
    }
}

/// A way of pairing candidates (bills or invoices) with transactions.
pub trait LinkStrategy {
    fn link(&self, transactions: &[Transaction], candidates: &[Document]) -> Vec<LinkPair>;
}

/// Exact date and absolute-amount equality; the first transaction in
/// iteration order wins when several match.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl LinkStrategy for ExactMatch {
    fn link(&self, transactions: &[Transaction], candidates: &[Document]) -> Vec<LinkPair> {
        link(transactions, candidates)
    }
}

fn matches(transaction: &Transaction, candidate: &Document) -> bool {
    match (&transaction.date, &candidate.date) {
        (Some(t), Some(c)) => t == c && transaction.amount.abs() == candidate.amount,
        _ => false,
    }
}

pub fn link(transactions: &[Transaction], candidates: &[Document]) -> Vec<LinkPair> {
    candidates
        .iter()
        .filter_map(|candidate| {
            transactions
                .iter()
                .find(|t| matches(t, candidate))
                .map(|t| LinkPair {
                    candidate_id: candidate.id,
                    transaction_id: t.id,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// run_linking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindSummary {
    pub candidates: usize,
    pub linked: usize,
    pub unmatched: usize,
    pub excluded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkSummary {
    pub transactions: usize,
    pub bills: KindSummary,
    pub invoices: KindSummary,
}

fn link_kind(
    store: &Store,
    strategy: &impl LinkStrategy,
    transactions: &[Transaction],
    kind: RecordKind,
) -> Result<KindSummary> {
    let all = store.documents(kind)?;
    let total = all.len();
    let candidates: Vec<Document> = all.into_iter().filter(|r| r.is_linkable()).collect();
    let pairs = strategy.link(transactions, &candidates);
    store.write_links(kind, &pairs)?;

    let summary = KindSummary {
        candidates: candidates.len(),
        linked: pairs.len(),
        unmatched: candidates.len() - pairs.len(),
        excluded: total - candidates.len(),
    };
    debug!(kind = %kind, ?summary, "linking pass complete");
    Ok(summary)
}

/// Recompute every bill and invoice link from scratch.
pub fn run_linking(store: &Store) -> Result<LinkSummary> {
    run_linking_with(store, &ExactMatch)
}

pub fn run_linking_with(store: &Store, strategy: &impl LinkStrategy) -> Result<LinkSummary> {
    let transactions: Vec<Transaction> = store
        .transactions()?
        .into_iter()
        .filter(|r| r.is_linkable())
        .collect();

    let bills = link_kind(store, strategy, &transactions, RecordKind::Bill)?;
    let invoices = link_kind(store, strategy, &transactions, RecordKind::Invoice)?;

    info!(
        transactions = transactions.len(),
        bills_linked = bills.linked,
        invoices_linked = invoices.linked,
        "linking finished"
    );
    Ok(LinkSummary {
        transactions: transactions.len(),
        bills,
        invoices,
    })
}
