use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::models::Transaction;
use crate::storage::query::DEFAULT_PAGE_LIMIT;
use crate::storage::{Storage, StorageError, TransactionFilter, TransactionPage};
use crate::types::TransactionId;

#[derive(Debug, Clone)]
struct StoredTransaction {
    sequence: u64,
    transaction: Transaction
}

/// In-memory transaction store keyed by transaction id.
///
/// The id acts as a primary key, a batch carrying an id that is already stored (or
/// repeated inside the batch) is rejected before any of its rows are inserted.
pub struct TransactionStorage {
    rows: Arc<DashMap<TransactionId, StoredTransaction>>,
    sequence: AtomicU64
}

impl Default for TransactionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStorage {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(DashMap::new()),
            sequence: AtomicU64::new(0)
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.rows.get(&transaction_id).map(|row| row.transaction.clone())
    }

    /// All stored transactions in insertion order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.ordered_rows().into_iter().map(|row| row.transaction).collect()
    }

    /// Lists, in insertion order, at most `limit` transactions matching `filter`.
    pub fn find(&self, filter: &TransactionFilter, limit: Option<usize>) -> TransactionPage {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        let matching: Vec<Transaction> = self.ordered_rows()
            .into_iter()
            .map(|row| row.transaction)
            .filter(|transaction| filter.matches(transaction))
            .collect();

        let total = matching.len();
        let data = matching.into_iter().take(limit).collect();

        TransactionPage { data, total, limit }
    }

    /// Removes every stored transaction, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();

        debug!("Cleared [{removed}] transactions from storage");

        removed
    }

    fn ordered_rows(&self) -> Vec<StoredTransaction> {
        let mut rows: Vec<StoredTransaction> = self.rows.iter().map(|row| row.value().clone()).collect();
        rows.sort_by_key(|row| row.sequence);
        rows
    }

    fn check_batch(&self, batch: &[Transaction]) -> Result<(), StorageError> {
        let mut ids = HashSet::with_capacity(batch.len());

        for transaction in batch {
            if !ids.insert(transaction.id) || self.rows.contains_key(&transaction.id) {
                return Err(StorageError::DuplicateId { transaction_id: transaction.id });
            }
        }

        Ok(())
    }
}

impl Storage for TransactionStorage {
    async fn insert_batch(&self, batch: Vec<Transaction>) -> Result<(), StorageError> {
        self.check_batch(&batch)?;

        for transaction in batch {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            self.rows.insert(transaction.id, StoredTransaction { sequence, transaction });
        }

        Ok(())
    }
}
