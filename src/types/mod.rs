mod errors;
mod timestamp;

pub use errors::TimestampError;
pub use timestamp::parse_timestamp;

pub type TransactionId = u64;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
