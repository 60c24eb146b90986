//! # Lead Handlers
//!
//! Intake from the public form and the CRM dashboard operations. Leads are
//! stored by the automation backend; these handlers validate, normalize and
//! forward.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, NaiveDate, Utc};
use dentiro_core::{
    availability::{ensure_bookable, slot_start},
    dashboard::{DateFilter, LeadPage, LeadQuery, LeadStats, SortOrder, apply_query, lead_stats},
    errors::ClinicError,
    models::lead::{
        CreateLeadRequest, CreateLeadResponse, Lead, LeadStatus, LeadWebhookPayload,
        UpdateLeadRequest, format_phone_number, normalize_leads,
    },
    timezone::format_local_iso,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    ApiState, handlers::availability::booked_ranges_for_month,
    middleware::error_handling::AppError,
};

/// Date filter names accepted in the query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilterParam {
    #[default]
    All,
    Today,
    Tomorrow,
    Custom,
}

/// Query parameters of the dashboard listing
#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub date_filter: DateFilterParam,
    pub date: Option<NaiveDate>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<usize>,
}

impl ListLeadsQuery {
    pub fn to_lead_query(&self) -> LeadQuery {
        let date_filter = match self.date_filter {
            DateFilterParam::All => DateFilter::All,
            DateFilterParam::Today => DateFilter::Today,
            DateFilterParam::Tomorrow => DateFilter::Tomorrow,
            DateFilterParam::Custom => DateFilter::Custom(self.date),
        };

        LeadQuery {
            date_filter,
            search: self.q.clone(),
            sort: self.sort,
            page: self.page.unwrap_or(1),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListLeadsResponse {
    #[serde(flatten)]
    pub page: LeadPage,
    pub stats: LeadStats,
}

/// Lists leads for the dashboard
///
/// # Endpoint
///
/// ```text
/// GET /api/leads?status=phone-confirmed&date_filter=today&q=tremblay&sort=nameAsc&page=2
/// ```
///
/// Counts in `stats` cover every lead the backend returned, before the date
/// filter and search narrow the page.
pub async fn list_leads(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<ListLeadsResponse>, AppError> {
    let now = Utc::now();
    let raw = state.webhooks.fetch_leads(query.status).await?;
    let leads = normalize_leads(raw, now);

    let stats = lead_stats(&leads);
    let page = apply_query(leads, &query.to_lead_query(), now);

    Ok(Json(ListLeadsResponse { page, stats }))
}

/// Records a new inquiry from the public intake form
///
/// # Endpoint
///
/// ```text
/// POST /api/leads
/// ```
///
/// # Errors
///
/// * `400 Bad Request` - invalid contact details, or an appointment slot
///   that is before the cutoff or already taken
/// * `502 Bad Gateway` - the leads webhook rejected the record
pub async fn create_lead(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<CreateLeadResponse>), AppError> {
    request.validate()?;
    let now = Utc::now();

    let date_visite = match &request.appointment {
        Some(selection) => {
            let (ranges, _) =
                booked_ranges_for_month(&state, selection.date.year(), selection.date.month())
                    .await?;
            ensure_bookable(selection.date, selection.time, &ranges, now)?;
            Some(format_local_iso(slot_start(selection.date, selection.time)?))
        }
        None => None,
    };

    let lead = Lead {
        id: now.timestamp_millis().to_string(),
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        phone: format_phone_number(&request.phone),
        lead_type: request.lead_type,
        status: LeadStatus::PhoneUnconfirmed,
        description: request.description.filter(|d| !d.trim().is_empty()),
        calendar_url: None,
        calendar_id: None,
        reschedule_url: None,
        cancel_url: None,
        reminder_sent: false,
        reminder_date: None,
        date_visite,
        updated_at: None,
        created_at: format_local_iso(now),
    };

    // The backend assigns its own id on creation
    let payload = LeadWebhookPayload {
        id: None,
        ..LeadWebhookPayload::from(&lead)
    };
    state.webhooks.create_lead(&payload).await?;

    info!(lead_type = lead.lead_type.as_str(), "Lead created");
    Ok((StatusCode::CREATED, Json(CreateLeadResponse { lead })))
}

/// Saves a staff edit of a lead
///
/// # Endpoint
///
/// ```text
/// PUT /api/leads/{id}
/// ```
///
/// # Errors
///
/// * `400 Bad Request` - the body is for a different lead than the path
pub async fn update_lead(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    let mut lead = request.lead;
    if lead.id != id {
        return Err(ClinicError::Validation(format!(
            "Lead id '{}' does not match the path id '{}'",
            lead.id, id
        ))
        .into());
    }

    lead.updated_at = Some(format_local_iso(Utc::now()));

    let payload = LeadWebhookPayload::from(&lead);
    state.webhooks.update_lead(&payload).await?;

    info!(%id, status = lead.status.as_str(), "Lead updated");
    Ok(Json(lead))
}

/// Removes a lead
///
/// # Endpoint
///
/// ```text
/// DELETE /api/leads/{id}
/// ```
pub async fn delete_lead(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.webhooks.delete_lead(&id).await?;

    info!(%id, "Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}
