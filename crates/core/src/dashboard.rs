//! # Dashboard Query
//!
//! Filtering, search, sorting and pagination of normalized leads for the
//! admin CRM views. The backend returns every lead matching a status, so the
//! rest of the narrowing happens here.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::lead::{Lead, LeadStatus, LeadType},
    timezone::{self, local_date, local_date_of},
};

/// Number of leads shown per dashboard page
pub const PAGE_SIZE: usize = 24;

/// Visit-date filter, evaluated in the reference timezone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Tomorrow,
    /// A specific day; `None` matches every lead that has a visit date
    Custom(Option<NaiveDate>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    DateVisiteAsc,
    #[default]
    DateVisiteDesc,
    NameAsc,
    NameDesc,
    CreatedAsc,
    CreatedDesc,
}

/// Everything the dashboard can narrow a lead list by
#[derive(Debug, Clone, Default)]
pub struct LeadQuery {
    pub date_filter: DateFilter,
    pub search: Option<String>,
    pub sort: SortOrder,
    /// One-based page number; clamped into range
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStats {
    pub total: usize,
    pub phone_unconfirmed: usize,
    pub phone_confirmed: usize,
    pub canceled: usize,
    pub no_show: usize,
    pub completed: usize,
    pub appointments: usize,
    pub emergencies: usize,
}

/// Counts leads per status and per request type
pub fn lead_stats(leads: &[Lead]) -> LeadStats {
    leads.iter().fold(
        LeadStats {
            total: leads.len(),
            ..LeadStats::default()
        },
        |mut stats, lead| {
            match lead.status {
                LeadStatus::PhoneUnconfirmed => stats.phone_unconfirmed += 1,
                LeadStatus::PhoneConfirmed => stats.phone_confirmed += 1,
                LeadStatus::Canceled => stats.canceled += 1,
                LeadStatus::NoShow => stats.no_show += 1,
                LeadStatus::Completed => stats.completed += 1,
            }
            match lead.lead_type {
                LeadType::Appointment => stats.appointments += 1,
                LeadType::Emergency => stats.emergencies += 1,
                LeadType::Question => {}
            }
            stats
        },
    )
}

/// Returns true when the lead's visit falls on the filtered day
pub fn matches_date_filter(lead: &Lead, filter: DateFilter, now: DateTime<Utc>) -> bool {
    if filter == DateFilter::All {
        return true;
    }

    let Some(visit) = lead.date_visite.as_deref() else {
        return false;
    };

    let today = local_date(now);
    match filter {
        DateFilter::All => true,
        DateFilter::Today => local_date_of(visit) == Some(today),
        DateFilter::Tomorrow => local_date_of(visit) == Some(today + Duration::days(1)),
        DateFilter::Custom(None) => true,
        DateFilter::Custom(Some(day)) => local_date_of(visit) == Some(day),
    }
}

/// Case-insensitive substring search over the fields staff look leads up by
pub fn matches_search(lead: &Lead, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let optional = [
        lead.calendar_url.as_deref(),
        lead.calendar_id.as_deref(),
        lead.reschedule_url.as_deref(),
        lead.cancel_url.as_deref(),
    ];

    let haystack = [
        lead.name.as_str(),
        lead.email.as_str(),
        lead.phone.as_str(),
        lead.lead_type.as_str(),
        lead.lead_type.label(),
        lead.status.as_str(),
        lead.status.label(),
    ]
    .into_iter()
    .chain(optional.into_iter().flatten())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    haystack.contains(&needle)
}

/// Lowercases and folds French diacritics and ligatures for name ordering
fn collation_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .fold(String::with_capacity(value.len()), |mut key, c| {
            match c {
                'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => key.push('a'),
                'ç' => key.push('c'),
                'é' | 'è' | 'ê' | 'ë' => key.push('e'),
                'î' | 'ï' | 'í' | 'ì' => key.push('i'),
                'ñ' => key.push('n'),
                'ô' | 'ö' | 'ó' | 'ò' | 'õ' => key.push('o'),
                'ù' | 'û' | 'ü' | 'ú' => key.push('u'),
                'ÿ' | 'ý' => key.push('y'),
                'œ' => key.push_str("oe"),
                'æ' => key.push_str("ae"),
                other => key.push(other),
            }
            key
        })
}

fn timestamp_of(value: Option<&str>) -> Option<i64> {
    value
        .and_then(timezone::parse_instant)
        .map(|instant| instant.timestamp_millis())
}

/// Orders two leads; undated visits always sink to the bottom
pub fn compare_leads(a: &Lead, b: &Lead, sort: SortOrder) -> Ordering {
    match sort {
        SortOrder::NameAsc => collation_key(&a.name).cmp(&collation_key(&b.name)),
        SortOrder::NameDesc => collation_key(&b.name).cmp(&collation_key(&a.name)),
        SortOrder::CreatedAsc | SortOrder::CreatedDesc => {
            let a_created = timestamp_of(Some(a.created_at.as_str())).unwrap_or(0);
            let b_created = timestamp_of(Some(b.created_at.as_str())).unwrap_or(0);
            if sort == SortOrder::CreatedAsc {
                a_created.cmp(&b_created)
            } else {
                b_created.cmp(&a_created)
            }
        }
        SortOrder::DateVisiteAsc | SortOrder::DateVisiteDesc => {
            match (
                timestamp_of(a.date_visite.as_deref()),
                timestamp_of(b.date_visite.as_deref()),
            ) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a_date), Some(b_date)) if sort == SortOrder::DateVisiteAsc => {
                    a_date.cmp(&b_date)
                }
                (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
            }
        }
    }
}

/// Applies a dashboard query to a lead list and returns the requested page
pub fn apply_query(leads: Vec<Lead>, query: &LeadQuery, now: DateTime<Utc>) -> LeadPage {
    let search = query.search.as_deref().unwrap_or_default();

    let mut matching: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| matches_date_filter(lead, query.date_filter, now))
        .filter(|lead| matches_search(lead, search))
        .collect();

    matching.sort_by(|a, b| compare_leads(a, b, query.sort));

    let total = matching.len();
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = query.page.clamp(1, total_pages);

    let leads = matching
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    LeadPage {
        leads,
        page,
        total_pages,
        total,
    }
}
