//! # Availability Handlers
//!
//! Calendar and slot views for the booking pages. Booked ranges come from the
//! availability webhook one month at a time; the actual blocking decisions
//! live in [`dentiro_core::availability`].
//!
//! When the webhook cannot be reached the pages stay usable: every slot is
//! reported as open and `availability_error` carries the reason, so the
//! client can warn the patient that the schedule may be out of date.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, NaiveDate, Utc};
use dentiro_core::{
    availability::{
        BookedRange, CalendarDay, SlotAvailability, TimeSlot, day_is_fully_booked, day_schedule,
        generate_time_slots, month_calendar, normalize_booked_slots,
    },
    errors::ClinicResult,
    timezone::{format_local_iso, is_before_cutoff, month_bounds},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthAvailabilityResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    #[serde(default)]
    pub availability_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayAvailabilityResponse {
    pub date: NaiveDate,
    pub past: bool,
    pub fully_booked: bool,
    pub slots: Vec<SlotAvailability>,
    #[serde(default)]
    pub availability_error: Option<String>,
}

/// Booked ranges of a month, or an empty list plus the failure reason
///
/// # Errors
///
/// Only an invalid year/month fails; webhook errors are absorbed.
pub(crate) async fn booked_ranges_for_month(
    state: &ApiState,
    year: i32,
    month: u32,
) -> ClinicResult<(Vec<BookedRange>, Option<String>)> {
    let (start, end) = month_bounds(year, month)?;
    let month_start = format_local_iso(start.with_timezone(&Utc));
    let month_end = format_local_iso(end.with_timezone(&Utc));

    match state
        .webhooks
        .fetch_booked_slots(&month_start, &month_end)
        .await
    {
        Ok(raw) => Ok((normalize_booked_slots(&raw), None)),
        Err(err) => {
            warn!(
                year,
                month,
                error = %err,
                "Availability unavailable, treating every slot as open"
            );
            Ok((Vec::new(), Some(err.to_string())))
        }
    }
}

/// Lists the bookable slot labels
///
/// # Endpoint
///
/// ```text
/// GET /api/availability/slots
/// ```
pub async fn list_slots() -> Json<SlotsResponse> {
    Json(SlotsResponse {
        slots: generate_time_slots().to_vec(),
    })
}

/// Day-by-day availability of a month
///
/// # Endpoint
///
/// ```text
/// GET /api/availability/month?year=2025&month=3
/// ```
///
/// # Errors
///
/// * `400 Bad Request` - the month does not exist
pub async fn month_availability(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthAvailabilityResponse>, AppError> {
    let (ranges, availability_error) =
        booked_ranges_for_month(&state, query.year, query.month).await?;
    let days = month_calendar(query.year, query.month, &ranges, false, Utc::now())?;

    Ok(Json(MonthAvailabilityResponse {
        year: query.year,
        month: query.month,
        days,
        availability_error,
    }))
}

/// Slot-by-slot availability of one day
///
/// # Endpoint
///
/// ```text
/// GET /api/availability/day?date=2025-03-10
/// ```
pub async fn day_availability(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayAvailabilityResponse>, AppError> {
    let date = query.date;
    let (ranges, availability_error) =
        booked_ranges_for_month(&state, date.year(), date.month()).await?;

    Ok(Json(DayAvailabilityResponse {
        date,
        past: is_before_cutoff(date, Utc::now()),
        fully_booked: day_is_fully_booked(date, &ranges, false),
        slots: day_schedule(date, &ranges),
        availability_error,
    }))
}
