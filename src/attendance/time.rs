//! Calendar-day bucketing. All instants are UTC on the wire and in the
//! store; days are always reckoned in the employees' local calendar via
//! the configured fixed offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

fn offset(tz_offset_minutes: i32) -> FixedOffset {
    // Offset is clamped to +/-14h at config load.
    FixedOffset::east_opt(tz_offset_minutes * 60).expect("offset validated at startup")
}

/// The local calendar day an instant falls on.
pub fn local_date(at: DateTime<Utc>, tz_offset_minutes: i32) -> NaiveDate {
    at.with_timezone(&offset(tz_offset_minutes)).date_naive()
}

/// The local wall-clock time of an instant.
pub fn local_time(at: DateTime<Utc>, tz_offset_minutes: i32) -> NaiveTime {
    at.with_timezone(&offset(tz_offset_minutes)).time()
}

/// UTC half-open bounds `[start, end)` of one local calendar day.
pub fn day_bounds(date: NaiveDate, tz_offset_minutes: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = offset(tz_offset_minutes);
    let start = tz
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight exists"))
        .single()
        .expect("fixed offsets have no DST gaps")
        .with_timezone(&Utc);
    (start, start + Duration::days(1))
}
