use async_trait::async_trait;
use dentiro_core::{
    availability::RawBookedSlot,
    models::{
        chat::{ChatReply, ChatRequest},
        lead::{ApiLead, LeadStatus, LeadWebhookPayload},
        visit::{CancellationNotice, RescheduleNotice, VisitLookup},
    },
};
use mockall::mock;

use crate::WebhookGateway;

// Mock gateway for handler tests
mock! {
    pub WebhookGateway {}

    #[async_trait]
    impl WebhookGateway for WebhookGateway {
        async fn fetch_leads(&self, status: Option<LeadStatus>) -> eyre::Result<Vec<ApiLead>>;

        async fn create_lead(&self, lead: &LeadWebhookPayload) -> eyre::Result<()>;

        async fn update_lead(&self, lead: &LeadWebhookPayload) -> eyre::Result<()>;

        async fn delete_lead(&self, id: &str) -> eyre::Result<()>;

        async fn fetch_booked_slots(
            &self,
            month_start: &str,
            month_end: &str,
        ) -> eyre::Result<Vec<RawBookedSlot>>;

        async fn lookup_visit(&self, visit_id: &str) -> eyre::Result<VisitLookup>;

        async fn cancel_meeting(&self, visit_id: &str) -> eyre::Result<()>;

        async fn confirm_reschedule(&self, notice: &RescheduleNotice) -> eyre::Result<()>;

        async fn notify_cancellation(&self, notice: &CancellationNotice) -> eyre::Result<()>;

        async fn send_chat(&self, request: &ChatRequest) -> eyre::Result<ChatReply>;
    }
}
