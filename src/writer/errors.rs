use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Batch [{batch}/{total_batches}] was rejected after [{committed}] transactions were committed: {source}")]
    BatchRejected {
        batch: usize,
        total_batches: usize,
        committed: usize,
        source: StorageError
    }
}

impl PersistenceError {
    /// Number of transactions durably written before the failure.
    pub fn committed(&self) -> usize {
        match self {
            Self::BatchRejected { committed, .. } => *committed
        }
    }
}
