use eyre::{Result, eyre};
use std::env;

/// URLs of the automation webhooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEndpoints {
    /// Lead storage: GET lists, POST creates, PUT updates, DELETE removes
    pub leads: String,
    /// Booked calendar ranges for a month
    pub availability: String,
    /// Visit lookup behind reschedule and cancel links
    pub visit: String,
    pub cancel_meeting: String,
    pub rescheduled: String,
    pub cancellation_notice: String,
    pub chatbot: String,
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} environment variable not set", name))
}

impl WebhookEndpoints {
    /// Load every webhook URL from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            leads: required("WEBHOOK_LEADS_URL")?,
            availability: required("WEBHOOK_AVAILABILITY_URL")?,
            visit: required("WEBHOOK_VISIT_URL")?,
            cancel_meeting: required("WEBHOOK_CANCEL_MEETING_URL")?,
            rescheduled: required("WEBHOOK_RESCHEDULED_URL")?,
            cancellation_notice: required("WEBHOOK_CANCELLATION_NOTICE_URL")?,
            chatbot: required("WEBHOOK_CHATBOT_URL")?,
        })
    }

    /// Points every endpoint at paths under one base URL
    ///
    /// Handy for local stubs where a single server answers all webhooks.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            leads: format!("{}/leads", base),
            availability: format!("{}/check-availability", base),
            visit: format!("{}/visit", base),
            cancel_meeting: format!("{}/cancel-meeting", base),
            rescheduled: format!("{}/rescheduled", base),
            cancellation_notice: format!("{}/cancellation-notice", base),
            chatbot: format!("{}/chatbot", base),
        }
    }
}
