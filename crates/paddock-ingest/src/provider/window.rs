//! Date-window construction for the meeting list operation
//!
//! The provider indexes meetings by a UTC timestamp range that straddles
//! local-date boundaries across the supported regions. A "local race day"
//! maps to the window from 14:00 UTC on the previous day through
//! 12:59:59.999 UTC on the day itself.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};

/// UTC window covering one local race day.
pub fn fetch_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_before = date.checked_sub_days(Days::new(1)).unwrap_or(date);

    let start_time = NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default();
    let end_time = NaiveTime::from_hms_milli_opt(12, 59, 59, 999).unwrap_or_default();

    let start = Utc.from_utc_datetime(&day_before.and_time(start_time));
    let end = Utc.from_utc_datetime(&date.and_time(end_time));

    (start, end)
}

/// Window start formatted the way the provider expects it.
pub fn format_start(start: DateTime<Utc>) -> String {
    start.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Window end formatted with millisecond precision.
pub fn format_end(end: DateTime<Utc>) -> String {
    end.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
