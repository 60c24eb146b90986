use std::time::Duration;

use async_trait::async_trait;
use dentiro_core::{
    availability::RawBookedSlot,
    models::{
        chat::{ChatReply, ChatRequest},
        lead::{ApiLead, LeadStatus, LeadWebhookPayload},
        visit::{CancelMeetingNotice, CancellationNotice, RescheduleNotice, VisitLookup},
    },
};
use eyre::{Result, WrapErr, eyre};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{WebhookGateway, endpoints::WebhookEndpoints};

/// The leads webhook answers either with a bare array or wrapped in `leads`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeadsEnvelope {
    List(Vec<ApiLead>),
    Wrapped {
        #[serde(default)]
        leads: Vec<ApiLead>,
    },
}

/// [`WebhookGateway`] backed by plain HTTP calls
pub struct HttpWebhookClient {
    http: reqwest::Client,
    endpoints: WebhookEndpoints,
}

impl HttpWebhookClient {
    pub fn new(endpoints: WebhookEndpoints, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("Failed to build webhook HTTP client")?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &WebhookEndpoints {
        &self.endpoints
    }

    /// Sends a request and turns any non-2xx status into an error
    async fn send(&self, name: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("{} webhook request failed", name))?;

        let status = response.status();
        debug!(webhook = name, %status, "Webhook responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(eyre!("{} webhook returned {}: {}", name, status, body));
        }

        Ok(response)
    }
}

#[async_trait]
impl WebhookGateway for HttpWebhookClient {
    async fn fetch_leads(&self, status: Option<LeadStatus>) -> Result<Vec<ApiLead>> {
        let mut request = self.http.get(&self.endpoints.leads);
        if let Some(status) = status {
            request = request.query(&[("statut", status.as_str())]);
        }

        let envelope: LeadsEnvelope = self
            .send("leads", request)
            .await?
            .json()
            .await
            .wrap_err("Leads webhook returned an unexpected body")?;

        Ok(match envelope {
            LeadsEnvelope::List(leads) => leads,
            LeadsEnvelope::Wrapped { leads } => leads,
        })
    }

    async fn create_lead(&self, lead: &LeadWebhookPayload) -> Result<()> {
        self.send("leads", self.http.post(&self.endpoints.leads).json(lead))
            .await?;
        Ok(())
    }

    async fn update_lead(&self, lead: &LeadWebhookPayload) -> Result<()> {
        self.send("leads", self.http.put(&self.endpoints.leads).json(lead))
            .await?;
        Ok(())
    }

    async fn delete_lead(&self, id: &str) -> Result<()> {
        let request = self
            .http
            .delete(&self.endpoints.leads)
            .query(&[("id", id)]);
        self.send("leads", request).await?;
        Ok(())
    }

    async fn fetch_booked_slots(
        &self,
        month_start: &str,
        month_end: &str,
    ) -> Result<Vec<RawBookedSlot>> {
        let request = self
            .http
            .get(&self.endpoints.availability)
            .query(&[("month_start", month_start), ("month_end", month_end)]);

        let body: Value = self
            .send("availability", request)
            .await?
            .json()
            .await
            .wrap_err("Availability webhook returned an unexpected body")?;

        if !body.is_array() {
            return Err(eyre!("Invalid availability format: expected an array"));
        }

        serde_json::from_value(body).wrap_err("Invalid availability format")
    }

    async fn lookup_visit(&self, visit_id: &str) -> Result<VisitLookup> {
        let request = self
            .http
            .get(&self.endpoints.visit)
            .query(&[("visit_id", visit_id)]);

        self.send("visit", request)
            .await?
            .json()
            .await
            .wrap_err("Visit webhook returned an unexpected body")
    }

    async fn cancel_meeting(&self, visit_id: &str) -> Result<()> {
        let notice = CancelMeetingNotice {
            visit_id: visit_id.to_string(),
        };
        self.send(
            "cancel meeting",
            self.http.post(&self.endpoints.cancel_meeting).json(&notice),
        )
        .await?;
        Ok(())
    }

    async fn confirm_reschedule(&self, notice: &RescheduleNotice) -> Result<()> {
        self.send(
            "rescheduled",
            self.http.post(&self.endpoints.rescheduled).json(notice),
        )
        .await?;
        Ok(())
    }

    async fn notify_cancellation(&self, notice: &CancellationNotice) -> Result<()> {
        self.send(
            "cancellation notice",
            self.http
                .post(&self.endpoints.cancellation_notice)
                .json(notice),
        )
        .await?;
        Ok(())
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.send("chatbot", self.http.post(&self.endpoints.chatbot).json(request))
            .await?
            .json()
            .await
            .wrap_err("Chatbot webhook returned an unexpected body")
    }
}
