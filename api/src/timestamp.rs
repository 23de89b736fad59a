use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ApiError;

/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6fZ";

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| ApiError::InvalidTimestamp(raw.to_string()))
}
