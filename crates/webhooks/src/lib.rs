//! # Dentiro Webhooks
//!
//! Typed access to the automation webhooks that hold the clinic's leads,
//! calendar and messaging. The service owns no storage; every read and
//! write goes through [`WebhookGateway`].

pub mod client;
pub mod endpoints;
pub mod mock;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use dentiro_core::{
    availability::RawBookedSlot,
    models::{
        chat::{ChatReply, ChatRequest},
        lead::{ApiLead, LeadStatus, LeadWebhookPayload},
        visit::{CancellationNotice, RescheduleNotice, VisitLookup},
    },
};
use eyre::Result;

pub use client::HttpWebhookClient;
pub use endpoints::WebhookEndpoints;

/// Shared handle used by the API layer
pub type Gateway = Arc<dyn WebhookGateway>;

/// Operations offered by the automation backend
#[async_trait]
pub trait WebhookGateway: Send + Sync {
    /// Lists leads, optionally narrowed to one status
    async fn fetch_leads(&self, status: Option<LeadStatus>) -> Result<Vec<ApiLead>>;

    async fn create_lead(&self, lead: &LeadWebhookPayload) -> Result<()>;

    async fn update_lead(&self, lead: &LeadWebhookPayload) -> Result<()>;

    async fn delete_lead(&self, id: &str) -> Result<()>;

    /// Booked calendar ranges between two local ISO-8601 timestamps
    async fn fetch_booked_slots(
        &self,
        month_start: &str,
        month_end: &str,
    ) -> Result<Vec<RawBookedSlot>>;

    async fn lookup_visit(&self, visit_id: &str) -> Result<VisitLookup>;

    /// Releases the calendar booking of a visit
    async fn cancel_meeting(&self, visit_id: &str) -> Result<()>;

    async fn confirm_reschedule(&self, notice: &RescheduleNotice) -> Result<()>;

    async fn notify_cancellation(&self, notice: &CancellationNotice) -> Result<()>;

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Builds the HTTP gateway for the configured endpoints
pub fn create_client(endpoints: WebhookEndpoints, timeout: Duration) -> Result<Gateway> {
    let client = HttpWebhookClient::new(endpoints, timeout)?;
    Ok(Arc::new(client))
}
