use chrono::{DateTime, NaiveDateTime, Utc};

use crate::types::errors::TimestampError;
use crate::types::Timestamp;

/// Layouts accepted when the value carries no offset. Such values are read as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601-like string into an absolute instant.
///
/// Values with an offset (`Z`, `+02:00`, ...) are converted to UTC. Values without
/// one are assumed to already be UTC so that the result never depends on the host timezone.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, TimestampError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    NAIVE_LAYOUTS.iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()))
}
