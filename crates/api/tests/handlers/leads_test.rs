use axum::http::StatusCode;
use dentiro_api::handlers::leads::ListLeadsResponse;
use dentiro_core::{
    availability::slot_start,
    models::lead::{CreateLeadResponse, Lead, LeadStatus, LeadType, LeadWebhookPayload},
    timezone::format_local_iso,
};
use eyre::eyre;
use fake::{Fake, faker::name::en::Name};
use mockall::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::test_utils::{TestContext, api_lead, booked, days_from_today, slot};

fn intake_body() -> Value {
    json!({
        "name": "Marie Tremblay",
        "email": "marie@example.com",
        "phone": "514 555 1234",
        "lead_type": "appointment",
        "description": "Douleur molaire"
    })
}

fn edited_lead(id: &str) -> Lead {
    Lead {
        id: id.to_string(),
        name: "Marie Tremblay".to_string(),
        email: "marie@example.com".to_string(),
        phone: "+1 (514) 555-1234".to_string(),
        lead_type: LeadType::Appointment,
        status: LeadStatus::Completed,
        description: None,
        calendar_url: None,
        calendar_id: None,
        reschedule_url: None,
        cancel_url: None,
        reminder_sent: true,
        reminder_date: None,
        date_visite: Some("2099-01-15T10:00:00-05:00".to_string()),
        updated_at: None,
        created_at: "2024-01-01T09:00:00-05:00".to_string(),
    }
}

#[tokio::test]
async fn test_list_leads_sorts_and_counts() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_leads()
        .with(predicate::eq(None::<LeadStatus>))
        .times(1)
        .returning(|_| {
            Ok(vec![
                api_lead(1, "Zoé Roy", "Confirmé", None),
                api_lead(2, "Émile Gagnon", "absent", None),
                api_lead(3, "Alice Côté", "nouveau", None),
            ])
        });
    let server = ctx.server();

    let response = server
        .get("/api/leads")
        .add_query_param("sort", "nameAsc")
        .await;

    response.assert_status_ok();
    let body: ListLeadsResponse = response.json();
    let names: Vec<&str> = body.page.leads.iter().map(|lead| lead.name.as_str()).collect();
    assert_eq!(names, vec!["Alice Côté", "Émile Gagnon", "Zoé Roy"]);
    assert_eq!(body.page.total, 3);
    assert_eq!(body.page.total_pages, 1);
    assert_eq!(body.stats.total, 3);
    assert_eq!(body.stats.phone_confirmed, 1);
    assert_eq!(body.stats.no_show, 1);
    assert_eq!(body.stats.phone_unconfirmed, 1);
    assert_eq!(body.stats.appointments, 3);
}

#[tokio::test]
async fn test_list_leads_forwards_status_filter() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_leads()
        .with(predicate::eq(Some(LeadStatus::PhoneConfirmed)))
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let server = ctx.server();

    let response = server
        .get("/api/leads")
        .add_query_param("status", "phone-confirmed")
        .await;

    response.assert_status_ok();
    let body: ListLeadsResponse = response.json();
    assert_eq!(body.page.total, 0);
    assert_eq!(body.page.page, 1);
    assert_eq!(body.page.total_pages, 1);
}

#[tokio::test]
async fn test_list_leads_custom_date_and_search() {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_fetch_leads().returning(|_| {
        Ok(vec![
            api_lead(1, "Jean Pelletier", "confirmed", Some("2099-01-15T10:00:00-05:00")),
            api_lead(2, "Julie Pelletier", "confirmed", Some("2099-01-16T10:00:00-05:00")),
            api_lead(3, "Paul Lavoie", "confirmed", Some("2099-01-15T11:00:00-05:00")),
            api_lead(4, "Luc Pelletier", "confirmed", None),
        ])
    });
    let server = ctx.server();

    let body: ListLeadsResponse = server
        .get("/api/leads")
        .add_query_param("date_filter", "custom")
        .add_query_param("date", "2099-01-15")
        .add_query_param("q", "pelletier")
        .await
        .json();

    let ids: Vec<&str> = body.page.leads.iter().map(|lead| lead.id.as_str()).collect();
    assert_eq!(ids, vec!["1"]);
    assert_eq!(body.stats.total, 4);
}

#[tokio::test]
async fn test_list_leads_clamps_page_into_range() {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_fetch_leads().returning(|_| {
        Ok((1..=30)
            .map(|id| api_lead(id, &Name().fake::<String>(), "confirmed", None))
            .collect())
    });
    let server = ctx.server();

    let body: ListLeadsResponse = server
        .get("/api/leads")
        .add_query_param("page", 9)
        .await
        .json();

    assert_eq!(body.page.total_pages, 2);
    assert_eq!(body.page.page, 2);
    assert_eq!(body.page.leads.len(), 6);
}

#[tokio::test]
async fn test_list_leads_upstream_failure_is_bad_gateway() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_leads()
        .returning(|_| Err(eyre!("leads webhook returned 503")));
    let server = ctx.server();

    let response = server.get("/api/leads").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_create_lead_formats_and_forwards() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_create_lead()
        .withf(|payload: &LeadWebhookPayload| {
            payload.id.is_none()
                && payload.nom == "Marie Tremblay"
                && payload.telephone == "+1 (514) 555-1234"
                && payload.statut == LeadStatus::PhoneUnconfirmed
                && payload.type_demande == LeadType::Appointment
                && payload.date_visite.is_none()
        })
        .times(1)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let response = server.post("/api/leads").json(&intake_body()).await;

    response.assert_status(StatusCode::CREATED);
    let body: CreateLeadResponse = response.json();
    assert_eq!(body.lead.phone, "+1 (514) 555-1234");
    assert_eq!(body.lead.status, LeadStatus::PhoneUnconfirmed);
    assert!(!body.lead.reminder_sent);
    assert!(!body.lead.created_at.is_empty());
}

#[tokio::test]
async fn test_create_lead_with_free_appointment_sets_visit_date() {
    let day = days_from_today(10);
    let expected = format_local_iso(slot_start(day, slot("10:00")).unwrap());

    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_booked_slots()
        .returning(move |_, _| Ok(vec![booked(day, "09:00", "10:00")]));
    let forwarded = expected.clone();
    ctx.webhooks
        .expect_create_lead()
        .withf(move |payload: &LeadWebhookPayload| {
            payload.date_visite.as_deref() == Some(forwarded.as_str())
        })
        .times(1)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let mut request = intake_body();
    request["appointment"] = json!({ "date": day, "time": "10:00" });
    let response = server.post("/api/leads").json(&request).await;

    response.assert_status(StatusCode::CREATED);
    let body: CreateLeadResponse = response.json();
    assert_eq!(body.lead.date_visite, Some(expected));
}

#[rstest]
#[case::booked_slot(10, "09:30")]
#[case::today(0, "10:00")]
#[tokio::test]
async fn test_create_lead_rejects_unbookable_appointment(
    #[case] offset: i64,
    #[case] time: &str,
) {
    let day = days_from_today(offset);

    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_booked_slots()
        .returning(move |_, _| Ok(vec![booked(day, "09:00", "10:00")]));
    ctx.webhooks.expect_create_lead().never();
    let server = ctx.server();

    let mut request = intake_body();
    request["appointment"] = json!({ "date": day, "time": time });
    let response = server.post("/api/leads").json(&request).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_lead_fails_open_when_availability_errors() {
    let day = days_from_today(10);

    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_fetch_booked_slots()
        .returning(|_, _| Err(eyre!("timeout")));
    ctx.webhooks
        .expect_create_lead()
        .times(1)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let mut request = intake_body();
    request["appointment"] = json!({ "date": day, "time": "09:00" });
    let response = server.post("/api/leads").json(&request).await;

    response.assert_status(StatusCode::CREATED);
}

#[rstest]
#[case::blank_name("name", "  ")]
#[case::bad_email("email", "marie.example.com")]
#[case::short_phone("phone", "555-1234")]
#[tokio::test]
async fn test_create_lead_validates_contact_details(#[case] field: &str, #[case] value: &str) {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_create_lead().never();
    let server = ctx.server();

    let mut request = intake_body();
    request[field] = json!(value);
    let response = server.post("/api/leads").json(&request).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_lead_forwarding_failure_is_bad_gateway() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_create_lead()
        .returning(|_| Err(eyre!("leads webhook returned 500")));
    let server = ctx.server();

    let response = server.post("/api/leads").json(&intake_body()).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_update_lead_stamps_modification_time() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_update_lead()
        .withf(|payload: &LeadWebhookPayload| {
            payload.id.as_deref() == Some("42")
                && payload.statut == LeadStatus::Completed
                && payload.modifie_a.is_some()
        })
        .times(1)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let lead = edited_lead("42");
    let response = server
        .put("/api/leads/42")
        .json(&json!({ "lead": lead }))
        .await;

    response.assert_status_ok();
    let body: Lead = response.json();
    assert!(body.updated_at.is_some());
    assert_eq!(body.status, LeadStatus::Completed);
}

#[tokio::test]
async fn test_update_lead_rejects_body_for_another_lead() {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_update_lead().never();
    let server = ctx.server();

    let response = server
        .put("/api/leads/42")
        .json(&json!({ "lead": edited_lead("7") }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("does not match"));
}

#[tokio::test]
async fn test_delete_lead_forwards_id() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_delete_lead()
        .withf(|id: &str| id == "42")
        .times(1)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let response = server.delete("/api/leads/42").await;

    response.assert_status(StatusCode::NO_CONTENT);
}
