use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{TimestampError, TransactionId};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unable to open input at path [{}]: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        source: io::Error
    },
    #[error("Unable to read record [{record}]: {message}")]
    Read {
        record: usize,
        message: String
    },
    #[error("Malformed input at record [{record}]: {message}")]
    Malformed {
        record: usize,
        message: String
    },
    #[error("Invalid record [{record}]: {message}")]
    InvalidRecord {
        record: usize,
        message: String
    },
    #[error("Invalid timestamp in record [{record}] for transaction [{transaction_id}]: {source}")]
    InvalidTimestamp {
        record: usize,
        transaction_id: TransactionId,
        source: TimestampError
    },
    #[error("Record consumer stopped accepting records at record [{record}]")]
    SinkClosed {
        record: usize
    }
}

impl DecodeError {
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open { path: path.into(), source }
    }

    pub fn from_json(record: usize, error: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let message = error.to_string();

        match error.classify() {
            Category::Io => Self::Read { record, message },
            Category::Syntax | Category::Eof => Self::Malformed { record, message },
            Category::Data => Self::InvalidRecord { record, message }
        }
    }

    pub fn from_csv(record: usize, error: csv::Error) -> Self {
        let message = error.to_string();

        match error.kind() {
            csv::ErrorKind::Io(_) => Self::Read { record, message },
            csv::ErrorKind::Deserialize { .. } => Self::InvalidRecord { record, message },
            _ => Self::Malformed { record, message }
        }
    }

    /// Zero-based index of the record that was being decoded when the failure happened.
    pub fn record(&self) -> Option<usize> {
        match self {
            Self::Open { .. } => None,
            Self::Read { record, .. }
            | Self::Malformed { record, .. }
            | Self::InvalidRecord { record, .. }
            | Self::InvalidTimestamp { record, .. }
            | Self::SinkClosed { record } => Some(*record)
        }
    }
}
