//! Billing period boundaries
//!
//! Usage is aggregated calendar-month-to-date in UTC.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// First instant of the calendar month containing `now` (UTC midnight)
pub fn period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        // The first of a month derived from a valid date always exists
        .unwrap_or_else(|| now.naive_utc());
    Utc.from_utc_datetime(&first)
}

/// First instant of the month before the one containing `now`
pub fn previous_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let start = period_start(now);
    period_start(start - chrono::Duration::days(1))
}
