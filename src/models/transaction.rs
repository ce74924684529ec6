use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{parse_timestamp, Timestamp, TimestampError, TransactionId};

/// Represents a single record as it appears in a JSON input file.
///
/// The timestamp is kept as text so that an unparseable value can be reported
/// against the record that carried it. The legacy field names (`valor`, `pagador`,
/// `recebedor`) are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    //NOTE: JSON numbers reach the decimal as their source text, never through f64
    #[serde(alias = "valor", with = "rust_decimal::serde::arbitrary_precision")]
    pub value: Decimal,
    #[serde(alias = "pagador")]
    pub payer: String,
    #[serde(alias = "recebedor")]
    pub payee: String,
    pub timestamp: String
}

/// Represents a single CSV row, same fields as `TransactionRecord`.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvTransactionRecord {
    pub id: TransactionId,
    //NOTE: csv infers a float from numeric text unless the field is requested as a string
    #[serde(alias = "valor", with = "rust_decimal::serde::str")]
    pub value: Decimal,
    #[serde(alias = "pagador")]
    pub payer: String,
    #[serde(alias = "recebedor")]
    pub payee: String,
    pub timestamp: String
}

impl From<CsvTransactionRecord> for TransactionRecord {
    fn from(record: CsvTransactionRecord) -> Self {
        Self {
            id: record.id,
            value: record.value,
            payer: record.payer,
            payee: record.payee,
            timestamp: record.timestamp
        }
    }
}

/// A decoded transaction.
///
/// Instances are never mutated after decoding, the duplicate filter only reorders
/// and selects them before they are handed over to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Externally assigned identifier, unique per input file.
    pub id: TransactionId,
    /// Exact decimal amount.
    pub value: Decimal,
    /// Opaque identifier of the paying party.
    pub payer: String,
    /// Opaque identifier of the receiving party.
    pub payee: String,
    /// Absolute instant of the transaction.
    pub timestamp: Timestamp
}

impl Transaction {
    /// Borrows the `(value, payer, payee)` triple used to group duplicate candidates.
    pub fn duplicate_key(&self) -> DuplicateKey<'_> {
        DuplicateKey {
            value: &self.value,
            payer: &self.payer,
            payee: &self.payee
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = TimestampError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&record.timestamp)?;

        Ok(Self {
            id: record.id,
            value: record.value,
            payer: record.payer,
            payee: record.payee,
            timestamp
        })
    }
}

/// Composite key of two transactions that may be duplicates of each other.
///
/// Value equality is numeric, `100.0` and `100.00` produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplicateKey<'a> {
    pub value: &'a Decimal,
    pub payer: &'a str,
    pub payee: &'a str
}
