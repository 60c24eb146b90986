//! # Visit Handlers
//!
//! Back the reschedule and cancel links sent to patients. The visit id in the
//! link is the only credential; the visit lookup webhook decides whether it
//! is valid.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{SecondsFormat, Utc};
use dentiro_core::{
    availability::{ensure_bookable, normalize_booked_slots, slot_start},
    errors::ClinicError,
    models::visit::{
        CancelDetails, CancelRequest, CancelResponse, CancellationNotice, RescheduleDetails,
        RescheduleNotice, RescheduleRequest, RescheduleResponse, VisitLookup,
    },
    timezone::format_local_iso,
};
use tracing::info;

use crate::{ApiState, middleware::error_handling::AppError};

const INVALID_LINK: &str = "Visit not found or link invalid";

async fn lookup(state: &ApiState, visit_id: &str) -> Result<VisitLookup, AppError> {
    Ok(state.webhooks.lookup_visit(visit_id).await?)
}

/// Current appointment and booked calendar ranges for a reschedule link
///
/// # Endpoint
///
/// ```text
/// GET /api/visits/{visit_id}/reschedule
/// ```
///
/// # Errors
///
/// * `404 Not Found` - the lookup has no visit date for this id
pub async fn reschedule_details(
    State(state): State<Arc<ApiState>>,
    Path(visit_id): Path<String>,
) -> Result<Json<RescheduleDetails>, AppError> {
    let visit = lookup(&state, &visit_id).await?;
    let visit_date = visit
        .scheduled_date()
        .ok_or_else(|| ClinicError::NotFound(INVALID_LINK.to_string()))?
        .to_string();

    let booked_ranges = normalize_booked_slots(visit.booked_slots.as_deref().unwrap_or_default());

    Ok(Json(RescheduleDetails {
        visit_id,
        visit_date,
        booked_ranges,
    }))
}

/// Moves a visit to a new slot
///
/// The old calendar booking is released first; the reschedule notice is
/// only sent once that succeeded.
///
/// # Endpoint
///
/// ```text
/// POST /api/visits/{visit_id}/reschedule
/// ```
///
/// # Errors
///
/// * `404 Not Found` - the link does not point at a scheduled visit
/// * `400 Bad Request` - the new slot is before the cutoff or taken
/// * `502 Bad Gateway` - a webhook call failed
pub async fn reschedule_visit(
    State(state): State<Arc<ApiState>>,
    Path(visit_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>, AppError> {
    let visit = lookup(&state, &visit_id).await?;
    if visit.scheduled_date().is_none() {
        return Err(ClinicError::NotFound(INVALID_LINK.to_string()).into());
    }

    let ranges = normalize_booked_slots(visit.booked_slots.as_deref().unwrap_or_default());
    ensure_bookable(request.date, request.time, &ranges, Utc::now())?;
    let new_date = format_local_iso(slot_start(request.date, request.time)?);

    state.webhooks.cancel_meeting(&visit_id).await?;

    let notice = RescheduleNotice {
        visit_id: visit_id.clone(),
        new_date: new_date.clone(),
        rescheduled_by: request.rescheduled_by.unwrap_or_default(),
    };
    state.webhooks.confirm_reschedule(&notice).await?;

    info!(%visit_id, %new_date, "Visit rescheduled");
    Ok(Json(RescheduleResponse { visit_id, new_date }))
}

/// Confirms a cancel link before the patient is asked to confirm
///
/// # Endpoint
///
/// ```text
/// GET /api/visits/{visit_id}/cancel
/// ```
pub async fn cancel_details(
    State(state): State<Arc<ApiState>>,
    Path(visit_id): Path<String>,
) -> Result<Json<CancelDetails>, AppError> {
    let visit = lookup(&state, &visit_id).await?;
    if !visit.is_verified() {
        return Err(ClinicError::NotFound(INVALID_LINK.to_string()).into());
    }

    Ok(Json(CancelDetails {
        visit_id,
        visit_date: visit.scheduled_date().map(str::to_string),
    }))
}

/// Cancels a visit and notifies the patient
///
/// # Endpoint
///
/// ```text
/// POST /api/visits/{visit_id}/cancel
/// ```
///
/// # Errors
///
/// * `404 Not Found` - the lookup does not verify this id
/// * `502 Bad Gateway` - a webhook call failed
pub async fn cancel_visit(
    State(state): State<Arc<ApiState>>,
    Path(visit_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<CancelResponse>, AppError> {
    let visit = lookup(&state, &visit_id).await?;
    if !visit.is_verified() {
        return Err(ClinicError::NotFound(INVALID_LINK.to_string()).into());
    }

    state.webhooks.cancel_meeting(&visit_id).await?;

    let notice = CancellationNotice {
        visit_id: visit_id.clone(),
        canceled: true,
        canceled_by: request.canceled_by.unwrap_or_default(),
        cancellation_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    state.webhooks.notify_cancellation(&notice).await?;

    info!(%visit_id, "Visit canceled");
    Ok(Json(CancelResponse {
        visit_id,
        canceled: true,
    }))
}
