mod errors;
mod query;
mod transaction_storage;

use std::future::Future;

use crate::models::Transaction;

pub use errors::StorageError;
pub use query::{TransactionFilter, TransactionPage};
pub use transaction_storage::TransactionStorage;

/// Durable destination of unique transactions.
///
/// A batch is accepted or rejected as a whole. Callers issue batches one at a time and
/// wait for the acknowledgment, so implementations may rely on insertion order.
pub trait Storage: Send + Sync + 'static {
    fn insert_batch(&self, batch: Vec<Transaction>) -> impl Future<Output = Result<(), StorageError>> + Send;
}
