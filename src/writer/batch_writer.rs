use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::models::Transaction;
use crate::storage::Storage;
use crate::writer::errors::PersistenceError;

const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct WriteSummary {
    pub batches: usize,
    pub written: usize
}

/// Persists transactions in fixed-size batches, one batch at a time.
///
/// Each batch is awaited before the next one is issued, so storage sees the
/// transactions in the order they were given. A failed batch aborts the write,
/// batches committed before it are kept.
pub struct BatchWriter<S: Storage> {
    storage: Arc<S>,
    batch_size: usize
}

impl<S: Storage> BatchWriter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            batch_size: DEFAULT_BATCH_SIZE
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Writes every transaction, returning how many batches and rows were committed.
    ///
    /// # Errors
    /// Returns `PersistenceError` as soon as storage rejects a batch.
    pub async fn write_all(&self, transactions: Vec<Transaction>) -> Result<WriteSummary, PersistenceError> {
        let total = transactions.len();
        let total_batches = total.div_ceil(self.batch_size);
        let mut summary = WriteSummary::default();

        info!("Writing [{total}] transactions to storage in [{total_batches}] batches");

        let mut remaining = transactions.into_iter();

        loop {
            let batch: Vec<Transaction> = remaining.by_ref().take(self.batch_size).collect();

            if batch.is_empty() {
                break;
            }

            let batch_number = summary.batches + 1;
            let batch_length = batch.len();
            let timer = Instant::now();

            self.storage.insert_batch(batch).await.map_err(|source| PersistenceError::BatchRejected {
                batch: batch_number,
                total_batches,
                committed: summary.written,
                source
            })?;

            summary.batches = batch_number;
            summary.written += batch_length;

            info!(
                "Batch [{batch_number}/{total_batches}] persisted ({batch_length} transactions) in {:?}",
                timer.elapsed()
            );
        }

        debug!("All [{}] transactions written to storage", summary.written);

        Ok(summary)
    }
}
