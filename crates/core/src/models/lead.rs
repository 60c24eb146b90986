use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    availability::TimeSlot,
    errors::{ClinicError, ClinicResult},
    timezone::format_local_iso,
};

/// Kind of request a patient submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadType {
    Appointment,
    Emergency,
    Question,
}

impl LeadType {
    /// Maps a loosely written type from the CRM onto a known variant
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.unwrap_or_default().trim().to_lowercase().as_str() {
            "rendez-vous" | "rendez vous" | "appointment" => Self::Appointment,
            "urgence" | "emergency" => Self::Emergency,
            _ => Self::Question,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::Emergency => "emergency",
            Self::Question => "question",
        }
    }

    /// French label shown to clinic staff
    pub fn label(&self) -> &'static str {
        match self {
            Self::Appointment => "rendez-vous",
            Self::Emergency => "urgence",
            Self::Question => "question",
        }
    }
}

/// Where a lead stands in the confirmation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    PhoneUnconfirmed,
    PhoneConfirmed,
    Canceled,
    NoShow,
    Completed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        Self::PhoneUnconfirmed,
        Self::PhoneConfirmed,
        Self::Canceled,
        Self::NoShow,
        Self::Completed,
    ];

    /// Maps a loosely written status from the CRM onto a known variant
    ///
    /// The automation backend, older CRM exports and staff edits all use
    /// different spellings. Anything unrecognised is treated as a lead that
    /// still needs its phone number confirmed.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.unwrap_or_default().trim().to_lowercase().as_str() {
            "phone-confirmed" | "phone_confirmed" | "whatsapp-confirmed" | "confirme whatsapp"
            | "confirmé whatsapp" | "confirme" | "confirmé" | "confirmed" | "contacte"
            | "contacté" | "contacted" | "qualifie" | "qualifié" | "qualified" | "planifie"
            | "planifié" | "scheduled" => Self::PhoneConfirmed,
            "annule" | "annulé" | "canceled" | "cancelled" => Self::Canceled,
            "absent" | "no-show" => Self::NoShow,
            "complete" | "complété" | "completed" => Self::Completed,
            _ => Self::PhoneUnconfirmed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhoneUnconfirmed => "phone-unconfirmed",
            Self::PhoneConfirmed => "phone-confirmed",
            Self::Canceled => "canceled",
            Self::NoShow => "no-show",
            Self::Completed => "completed",
        }
    }

    /// French label shown to clinic staff
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhoneUnconfirmed => "Non confirmé",
            Self::PhoneConfirmed => "Confirmé",
            Self::Canceled => "Annulé",
            Self::NoShow => "absent",
            Self::Completed => "Visite complétée",
        }
    }
}

/// A patient inquiry as held by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub lead_type: LeadType,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reschedule_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_visite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub created_at: String,
}

/// A lead record exactly as the automation backend returns it
///
/// Field names drift between the French schema and older English exports;
/// both are accepted and the French name wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiLead {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "typeDemande")]
    pub type_demande: Option<String>,
    #[serde(default, rename = "leadType")]
    pub lead_type: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calendar_url: Option<String>,
    #[serde(default, rename = "calendarUrl")]
    pub calendar_url_camel: Option<String>,
    #[serde(default)]
    pub calendar_id: Option<String>,
    #[serde(default, rename = "calendarId")]
    pub calendar_id_camel: Option<String>,
    #[serde(default)]
    pub reschedule_url: Option<String>,
    #[serde(default, rename = "rescheduleUrl")]
    pub reschedule_url_camel: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
    #[serde(default, rename = "cancelUrl")]
    pub cancel_url_camel: Option<String>,
    #[serde(default, rename = "rappelEnvoye")]
    pub rappel_envoye: Option<bool>,
    #[serde(default, rename = "reminderSent")]
    pub reminder_sent: Option<bool>,
    #[serde(default, rename = "dateRappel")]
    pub date_rappel: Option<String>,
    #[serde(default, rename = "reminderDate")]
    pub reminder_date: Option<String>,
    #[serde(default, rename = "dateVisite")]
    pub date_visite: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Converts a raw CRM record into a [`Lead`], filling every default
///
/// Records without an id get one derived from `now` in milliseconds, and
/// records without a creation time are stamped with `now`.
pub fn normalize_lead(api: ApiLead, now: DateTime<Utc>) -> Lead {
    let id = api
        .id
        .as_ref()
        .and_then(id_to_string)
        .unwrap_or_else(|| now.timestamp_millis().to_string());

    Lead {
        id,
        name: api.nom.or(api.name).unwrap_or_default(),
        email: api.email.unwrap_or_default(),
        phone: api.telephone.or(api.phone).unwrap_or_default(),
        lead_type: LeadType::from_wire(api.type_demande.or(api.lead_type).as_deref()),
        status: LeadStatus::from_wire(api.statut.or(api.status).as_deref()),
        description: api.description,
        calendar_url: api.calendar_url.or(api.calendar_url_camel),
        calendar_id: api.calendar_id.or(api.calendar_id_camel),
        reschedule_url: api.reschedule_url.or(api.reschedule_url_camel),
        cancel_url: api.cancel_url.or(api.cancel_url_camel),
        reminder_sent: api.rappel_envoye.or(api.reminder_sent).unwrap_or(false),
        reminder_date: api.date_rappel.or(api.reminder_date),
        date_visite: api.date_visite,
        updated_at: api.updated_at,
        created_at: api.created_at.unwrap_or_else(|| format_local_iso(now)),
    }
}

/// Normalizes a batch of CRM records
pub fn normalize_leads(data: Vec<ApiLead>, now: DateTime<Utc>) -> Vec<Lead> {
    data.into_iter().map(|lead| normalize_lead(lead, now)).collect()
}

/// Lead record in the shape the automation backend stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadWebhookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
    pub email: String,
    pub telephone: String,
    #[serde(rename = "typeDemande")]
    pub type_demande: LeadType,
    pub statut: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "rappelEnvoye")]
    pub rappel_envoye: bool,
    #[serde(rename = "dateRappel", default, skip_serializing_if = "Option::is_none")]
    pub date_rappel: Option<String>,
    #[serde(rename = "dateVisite", default, skip_serializing_if = "Option::is_none")]
    pub date_visite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reschedule_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(rename = "creeA")]
    pub cree_a: String,
    #[serde(rename = "modifieA", default, skip_serializing_if = "Option::is_none")]
    pub modifie_a: Option<String>,
}

impl From<&Lead> for LeadWebhookPayload {
    fn from(lead: &Lead) -> Self {
        Self {
            id: Some(lead.id.clone()),
            nom: lead.name.clone(),
            email: lead.email.clone(),
            telephone: lead.phone.clone(),
            type_demande: lead.lead_type,
            statut: lead.status,
            description: lead.description.clone(),
            rappel_envoye: lead.reminder_sent,
            date_rappel: lead.reminder_date.clone(),
            date_visite: lead.date_visite.clone(),
            calendar_url: lead.calendar_url.clone(),
            calendar_id: lead.calendar_id.clone(),
            reschedule_url: lead.reschedule_url.clone(),
            cancel_url: lead.cancel_url.clone(),
            cree_a: lead.created_at.clone(),
            modifie_a: lead.updated_at.clone(),
        }
    }
}

/// Appointment picked in the intake form or the reschedule page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub date: NaiveDate,
    pub time: TimeSlot,
}

/// Intake form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub lead_type: LeadType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub appointment: Option<SlotSelection>,
}

impl CreateLeadRequest {
    /// Checks the fields a lead cannot be followed up without
    pub fn validate(&self) -> ClinicResult<()> {
        if self.name.trim().is_empty() {
            return Err(ClinicError::Validation("Name is required".to_string()));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => {
                return Err(ClinicError::Validation(format!(
                    "Invalid email address: {}",
                    email
                )));
            }
        }

        if national_digits(&self.phone).len() != 10 {
            return Err(ClinicError::Validation(
                "Phone number must contain 10 digits".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadResponse {
    pub lead: Lead,
}

/// Staff edit of an existing lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLeadRequest {
    pub lead: Lead,
}

fn national_digits(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix('1') {
        Some(rest) => rest.to_string(),
        None => digits,
    }
}

/// Formats a North American phone number as `+1 (AAA) BBB-CCCC`
///
/// Works on partial input so it can be applied while the number is being
/// typed. A leading country code `1` is dropped before formatting and
/// digits past the tenth are ignored.
///
/// # Example
///
/// ```
/// use dentiro_core::models::lead::format_phone_number;
///
/// assert_eq!(format_phone_number("514-555-1234"), "+1 (514) 555-1234");
/// assert_eq!(format_phone_number("5145"), "+1 (514) 5");
/// ```
pub fn format_phone_number(value: &str) -> String {
    let digits = national_digits(value);
    let digits: String = digits.chars().take(10).collect();

    match digits.len() {
        0 => "+1 ".to_string(),
        1..=3 => format!("+1 ({}", digits),
        4..=6 => format!("+1 ({}) {}", &digits[..3], &digits[3..]),
        _ => format!("+1 ({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}
