//! # Availability Resolver
//!
//! Decides which of the clinic's fixed half-hour slots are already taken on
//! a given day, based on the booked ranges reported by the calendar
//! integration.
//!
//! ## Slot model
//!
//! The clinic books 30-minute slots from 08:00 to 18:00, giving twenty slots
//! per day (`08:00` through `17:30`). A slot on a given day covers
//! `[start, start + 30min)` in the reference timezone.
//!
//! ## Overlap rule
//!
//! A slot is blocked when it overlaps any booked range:
//!
//! ```text
//! slot.start < range.end && slot.end > range.start
//! ```
//!
//! Ranges that merely touch a slot (ending exactly at its start or starting
//! exactly at its end) leave it free.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    errors::{ClinicError, ClinicResult},
    timezone::{self, is_before_cutoff},
};

/// Length of a bookable slot in minutes
pub const SLOT_MINUTES: i64 = 30;

/// First bookable hour of the day
pub const OPENING_HOUR: u32 = 8;

/// Hour at which the last slot ends
pub const CLOSING_HOUR: u32 = 18;

static TIME_SLOTS: Lazy<Vec<TimeSlot>> = Lazy::new(|| {
    (OPENING_HOUR..CLOSING_HOUR)
        .flat_map(|hour| [TimeSlot { hour, minute: 0 }, TimeSlot { hour, minute: 30 }])
        .collect()
});

/// A booked interval as sent by the calendar integration
///
/// Deserialization never fails: any element that is not an object, and any
/// `start`/`end` that is not a string, becomes `None` and is later dropped by
/// [`normalize_booked_slots`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawBookedSlot {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl<'de> Deserialize<'de> for RawBookedSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

/// Reads an optional list of booked slots, treating a non-array as absent
pub fn deserialize_booked_slots<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<RawBookedSlot>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.iter().map(RawBookedSlot::from_value).collect()),
        _ => None,
    })
}

impl RawBookedSlot {
    /// Picks the string `start`/`end` out of any JSON value
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            start: field("start"),
            end: field("end"),
        }
    }

    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }
}

/// A booked interval in epoch milliseconds, half-open `[start_ms, end_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl BookedRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
        }
    }

    /// Open-interval overlap test against `[start_ms, end_ms)`
    pub fn overlaps(&self, start_ms: i64, end_ms: i64) -> bool {
        start_ms < self.end_ms && end_ms > self.start_ms
    }
}

/// One of the twenty fixed half-hour slots, labelled `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeSlot {
    hour: u32,
    minute: u32,
}

impl TimeSlot {
    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Wall-clock start of the slot
    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeSlot {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        generate_time_slots()
            .iter()
            .find(|slot| slot.to_string() == label)
            .copied()
            .ok_or_else(|| {
                ClinicError::Validation(format!(
                    "Invalid time slot '{}'. Expected a half hour between 08:00 and 17:30",
                    s
                ))
            })
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = ClinicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The twenty bookable slots of a day, ascending
///
/// Built once on first use and shared for the life of the process.
pub fn generate_time_slots() -> &'static [TimeSlot] {
    &TIME_SLOTS
}

/// Epoch-millisecond bounds of `slot` on `day`, in the reference timezone
pub fn slot_bounds(day: NaiveDate, slot: TimeSlot) -> Option<(i64, i64)> {
    let start = timezone::local_instant(day, slot.start_time())?;
    let end = start + Duration::minutes(SLOT_MINUTES);
    Some((start.timestamp_millis(), end.timestamp_millis()))
}

/// Returns true when `slot` on `day` overlaps any booked range
pub fn slot_is_blocked(day: NaiveDate, slot: TimeSlot, booked_ranges: &[BookedRange]) -> bool {
    let Some((start_ms, end_ms)) = slot_bounds(day, slot) else {
        return false;
    };

    booked_ranges
        .iter()
        .any(|range| range.overlaps(start_ms, end_ms))
}

/// Returns true when every slot of `day` is blocked
///
/// While availability is still loading, or when nothing is known to be
/// booked, days are never reported as full.
pub fn day_is_fully_booked(day: NaiveDate, booked_ranges: &[BookedRange], loading: bool) -> bool {
    if loading || booked_ranges.is_empty() {
        return false;
    }

    generate_time_slots()
        .iter()
        .all(|slot| slot_is_blocked(day, *slot, booked_ranges))
}

/// Parses wire slots into booked ranges, dropping unparseable entries
pub fn normalize_booked_slots(raw: &[RawBookedSlot]) -> Vec<BookedRange> {
    let ranges: Vec<BookedRange> = raw
        .iter()
        .filter_map(|slot| {
            let start = timezone::parse_instant(slot.start.as_deref()?)?;
            let end = timezone::parse_instant(slot.end.as_deref()?)?;
            Some(BookedRange::new(start, end))
        })
        .collect();

    let discarded = raw.len() - ranges.len();
    if discarded > 0 {
        debug!(discarded, "Discarded malformed booked ranges");
    }

    ranges
}

/// Availability of a single slot on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub time: TimeSlot,
    pub blocked: bool,
}

/// Availability of every slot on `day`
pub fn day_schedule(day: NaiveDate, booked_ranges: &[BookedRange]) -> Vec<SlotAvailability> {
    generate_time_slots()
        .iter()
        .map(|slot| SlotAvailability {
            time: *slot,
            blocked: slot_is_blocked(day, *slot, booked_ranges),
        })
        .collect()
}

/// Bookability summary of one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Today or earlier in the reference timezone
    pub past: bool,
    pub fully_booked: bool,
    pub selectable: bool,
}

/// Returns true when `day` can be picked: after the cutoff and not full
pub fn day_is_selectable(
    day: NaiveDate,
    booked_ranges: &[BookedRange],
    loading: bool,
    now: DateTime<Utc>,
) -> bool {
    !is_before_cutoff(day, now) && !day_is_fully_booked(day, booked_ranges, loading)
}

/// Builds the day-by-day view of a month
pub fn month_calendar(
    year: i32,
    month: u32,
    booked_ranges: &[BookedRange],
    loading: bool,
    now: DateTime<Utc>,
) -> ClinicResult<Vec<CalendarDay>> {
    let days = timezone::days_of_month(year, month)?;

    Ok(days
        .into_iter()
        .map(|date| {
            let past = is_before_cutoff(date, now);
            let fully_booked = day_is_fully_booked(date, booked_ranges, loading);
            CalendarDay {
                date,
                past,
                fully_booked,
                selectable: !past && !fully_booked,
            }
        })
        .collect())
}

/// Checks that `slot` on `day` may be booked right now
///
/// # Errors
///
/// * `ClinicError::Validation` - the day is before the booking cutoff, or
///   the slot overlaps a booked range
pub fn ensure_bookable(
    day: NaiveDate,
    slot: TimeSlot,
    booked_ranges: &[BookedRange],
    now: DateTime<Utc>,
) -> ClinicResult<()> {
    if is_before_cutoff(day, now) {
        return Err(ClinicError::Validation(format!(
            "Appointments must be booked from {} onwards",
            timezone::booking_cutoff(now)
        )));
    }

    if slot_is_blocked(day, slot, booked_ranges) {
        return Err(ClinicError::Validation(format!(
            "The {} slot on {} is no longer available",
            slot, day
        )));
    }

    Ok(())
}

/// Instant at which `slot` on `day` starts
pub fn slot_start(day: NaiveDate, slot: TimeSlot) -> ClinicResult<DateTime<Utc>> {
    timezone::local_instant(day, slot.start_time())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            ClinicError::Validation(format!("{} {} does not exist in local time", day, slot))
        })
}
