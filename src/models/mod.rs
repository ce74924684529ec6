mod transaction;

pub use transaction::{CsvTransactionRecord, DuplicateKey, Transaction, TransactionRecord};
