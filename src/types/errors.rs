use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("Timestamp error: Value is an empty string")]
    Empty,
    #[error("Timestamp error: [{0}] is not a valid ISO-8601 instant")]
    InvalidFormat(String)
}
