//! Flattening: nested provider objects -> flat relational rows
//!
//! Pure transformations. Missing or malformed optional data never raises;
//! only an entirely absent mandatory shape (no event id, no selections
//! array) is an error, which the synchronizer treats as "no data for this
//! unit" and skips.

pub mod exotics;
pub mod meeting;
pub mod odds;
pub mod row;
pub mod runners;

pub use exotics::flatten_exotics;
pub use meeting::flatten_meeting;
pub use odds::flatten_odds;
pub use row::{Row, SqlValue};
pub use runners::flatten_runners;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Mandatory provider shape was absent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("meeting has no id")]
    MissingMeetingId,

    #[error("event has no id")]
    MissingEventId,

    #[error("event has no selections array")]
    MissingSelections,
}

/// Parse a provider timestamp, tolerating RFC 3339 and bare datetime forms.
/// Unparseable input yields `None`, never an error.
pub(crate) fn parse_timestamp(input: Option<&str>) -> Option<DateTime<Utc>> {
    let s = input?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Parse a provider date, accepting either a bare date or any timestamp
/// form `parse_timestamp` handles.
pub(crate) fn parse_date(input: Option<&str>) -> Option<NaiveDate> {
    let s = input?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    parse_timestamp(Some(s)).map(|dt| dt.date_naive())
}
