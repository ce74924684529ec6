use thiserror::Error;

use crate::types::TransactionId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Transaction [{transaction_id}] already exists in storage")]
    DuplicateId {
        transaction_id: TransactionId
    },
    #[error("Storage rejected the batch: {reason}")]
    Rejected {
        reason: String
    }
}
