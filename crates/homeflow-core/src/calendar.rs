//! Calendar helpers.
//!
//! Timestamps are stored in UTC; "which day" and "which hour" questions are
//! answered in the user's fixed UTC offset.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc};

/// Calendar date of an instant in the given offset.
pub fn local_date(at: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    at.with_timezone(offset).date_naive()
}

/// Hour of day (0-23) of an instant in the given offset.
pub fn local_hour(at: DateTime<Utc>, offset: &FixedOffset) -> u32 {
    at.with_timezone(offset).hour()
}

/// UTC instant at which a local date begins.
pub fn start_of_day(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    (local_midnight - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
}

/// Half-open UTC range `[start, end)` covering the local day containing `now`.
pub fn day_bounds(now: DateTime<Utc>, offset: &FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(local_date(now, offset), offset);
    (start, start + Duration::days(1))
}

/// Half-open UTC range covering the Monday-start week containing `now`.
pub fn week_bounds(now: DateTime<Utc>, offset: &FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = local_date(now, offset);
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let start = start_of_day(monday, offset);
    (start, start + Duration::days(7))
}

/// Offset from a minutes value, falling back to UTC when out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix())
}
