use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::{BookedRange, RawBookedSlot, TimeSlot, deserialize_booked_slots};

/// Status value the visit lookup uses for a valid cancellation link
pub const VISIT_VERIFIED: &str = "verified";

/// Response of the visit lookup webhook
///
/// The same endpoint backs both the reschedule and cancel links, so every
/// field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitLookup {
    #[serde(default)]
    pub visit: Option<String>,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_booked_slots")]
    pub booked_slots: Option<Vec<RawBookedSlot>>,
}

impl VisitLookup {
    pub fn is_verified(&self) -> bool {
        self.visit.as_deref() == Some(VISIT_VERIFIED)
    }

    /// Current appointment date, if the link points at a real visit
    pub fn scheduled_date(&self) -> Option<&str> {
        self.visit_date.as_deref().filter(|date| !date.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleDetails {
    pub visit_id: String,
    pub visit_date: String,
    pub booked_ranges: Vec<BookedRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: TimeSlot,
    #[serde(default)]
    pub rescheduled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleResponse {
    pub visit_id: String,
    pub new_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelDetails {
    pub visit_id: String,
    pub visit_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub canceled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub visit_id: String,
    pub canceled: bool,
}

/// Body sent to release the calendar booking of a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelMeetingNotice {
    pub visit_id: String,
}

/// Body sent once a visit has been moved to a new slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleNotice {
    pub visit_id: String,
    /// Local ISO-8601 with offset, e.g. `2025-03-10T13:00:00-04:00`
    pub new_date: String,
    pub rescheduled_by: String,
}

/// Body sent so the patient is told their visit was canceled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationNotice {
    pub visit_id: String,
    pub canceled: bool,
    pub canceled_by: String,
    pub cancellation_date: String,
}
