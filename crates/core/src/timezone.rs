//! # Reference Clock
//!
//! The clinic operates on `America/Toronto` wall-clock time, the zone that
//! also covers Montreal. Every "local" date or time in the service is
//! interpreted in [`REFERENCE_TZ`], regardless of where the server process
//! runs.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::{America::Toronto, Tz};

use crate::errors::{ClinicError, ClinicResult};

/// Timezone used for slot computation, date filters and outbound timestamps
pub const REFERENCE_TZ: Tz = Toronto;

/// Returns the calendar day of `instant` in the reference timezone
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&REFERENCE_TZ).date_naive()
}

/// First day that may be booked: tomorrow, in the reference timezone
///
/// Today and every earlier day are closed to booking independently of
/// what the calendar reports as occupied.
pub fn booking_cutoff(now: DateTime<Utc>) -> NaiveDate {
    local_date(now) + Duration::days(1)
}

/// Returns true when `day` falls before the booking cutoff
pub fn is_before_cutoff(day: NaiveDate, now: DateTime<Utc>) -> bool {
    day < booking_cutoff(now)
}

/// Resolves a wall-clock date and time in the reference timezone
///
/// Ambiguous times (autumn fall-back) resolve to the earlier instant. Times
/// inside the spring-forward gap are pushed one hour later, the way a
/// calendar widget rolls them forward.
pub fn local_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time);
    REFERENCE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            REFERENCE_TZ
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
}

/// Formats an instant as local ISO-8601 with an explicit UTC offset
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dentiro_core::timezone::format_local_iso;
///
/// let instant = Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap();
/// assert_eq!(format_local_iso(instant), "2025-03-10T13:00:00-04:00");
/// ```
pub fn format_local_iso(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&REFERENCE_TZ)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Parses a timestamp as loosely as the booking calendar and CRM emit them
///
/// Accepted forms, in order:
///
/// - RFC 3339 with offset or `Z`
/// - date and time without offset, read as reference-timezone wall clock
/// - bare `YYYY-MM-DD`, read as UTC midnight
///
/// Returns `None` for anything else.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return local_instant(naive.date(), naive.time()).map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Returns the reference-timezone calendar day of a loosely formatted timestamp
pub fn local_date_of(value: &str) -> Option<NaiveDate> {
    parse_instant(value).map(local_date)
}

/// All calendar days of a month, in order
pub fn days_of_month(year: i32, month: u32) -> ClinicResult<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ClinicError::Validation(format!("Invalid month: {}-{}", year, month)))?;

    Ok(first
        .iter_days()
        .take_while(|day| day.month() == month)
        .collect())
}

/// Bounds used when asking the calendar integration for a month's bookings
///
/// Starts at 00:00:00 on the first day and ends at 23:59:59 on the last day,
/// both in the reference timezone.
pub fn month_bounds(year: i32, month: u32) -> ClinicResult<(DateTime<Tz>, DateTime<Tz>)> {
    let days = days_of_month(year, month)?;
    let invalid = || ClinicError::Validation(format!("Invalid month: {}-{}", year, month));

    let first = days.first().copied().ok_or_else(invalid)?;
    let last = days.last().copied().ok_or_else(invalid)?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;

    let start = local_instant(first, NaiveTime::MIN).ok_or_else(invalid)?;
    let end = local_instant(last, end_of_day).ok_or_else(invalid)?;

    Ok((start, end))
}
