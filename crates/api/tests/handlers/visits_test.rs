use axum::http::StatusCode;
use dentiro_core::{
    availability::slot_start,
    models::visit::{
        CancelDetails, CancelResponse, CancellationNotice, RescheduleDetails, RescheduleNotice,
        RescheduleResponse, VisitLookup,
    },
    timezone::format_local_iso,
};
use eyre::eyre;
use mockall::Sequence;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{TestContext, booked, days_from_today, slot};

fn scheduled_visit() -> VisitLookup {
    let day = days_from_today(10);
    VisitLookup {
        visit: Some("verified".to_string()),
        visit_date: Some("2099-01-15T10:00:00-05:00".to_string()),
        booked_slots: Some(vec![booked(day, "09:00", "10:00")]),
    }
}

#[tokio::test]
async fn test_reschedule_details_returns_booked_ranges() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_lookup_visit()
        .withf(|visit_id: &str| visit_id == "v-123")
        .returning(|_| Ok(scheduled_visit()));
    let server = ctx.server();

    let response = server.get("/api/visits/v-123/reschedule").await;

    response.assert_status_ok();
    let body: RescheduleDetails = response.json();
    assert_eq!(body.visit_id, "v-123");
    assert_eq!(body.visit_date, "2099-01-15T10:00:00-05:00");
    assert_eq!(body.booked_ranges.len(), 1);
    assert_eq!(
        body.booked_ranges[0].end_ms - body.booked_ranges[0].start_ms,
        60 * 60 * 1000
    );
}

#[tokio::test]
async fn test_reschedule_details_without_visit_date_is_not_found() {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_lookup_visit().returning(|_| {
        Ok(VisitLookup {
            visit_date: Some(String::new()),
            ..VisitLookup::default()
        })
    });
    let server = ctx.server();

    let response = server.get("/api/visits/v-404/reschedule").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_cancels_then_confirms() {
    let day = days_from_today(10);
    let expected = format_local_iso(slot_start(day, slot("14:30")).unwrap());

    let mut ctx = TestContext::new();
    let mut seq = Sequence::new();
    ctx.webhooks
        .expect_lookup_visit()
        .returning(|_| Ok(scheduled_visit()));
    ctx.webhooks
        .expect_cancel_meeting()
        .withf(|visit_id: &str| visit_id == "v-123")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let forwarded = expected.clone();
    ctx.webhooks
        .expect_confirm_reschedule()
        .withf(move |notice: &RescheduleNotice| {
            notice.visit_id == "v-123"
                && notice.new_date == forwarded
                && notice.rescheduled_by == "patient"
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let response = server
        .post("/api/visits/v-123/reschedule")
        .json(&json!({ "date": day, "time": "14:30", "rescheduled_by": "patient" }))
        .await;

    response.assert_status_ok();
    let body: RescheduleResponse = response.json();
    assert_eq!(body.new_date, expected);
}

#[tokio::test]
async fn test_reschedule_into_booked_slot_is_rejected() {
    let day = days_from_today(10);

    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_lookup_visit()
        .returning(|_| Ok(scheduled_visit()));
    ctx.webhooks.expect_cancel_meeting().never();
    ctx.webhooks.expect_confirm_reschedule().never();
    let server = ctx.server();

    let response = server
        .post("/api/visits/v-123/reschedule")
        .json(&json!({ "date": day, "time": "09:00" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reschedule_stops_when_cancel_fails() {
    let day = days_from_today(10);

    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_lookup_visit()
        .returning(|_| Ok(scheduled_visit()));
    ctx.webhooks
        .expect_cancel_meeting()
        .returning(|_| Err(eyre!("cancel meeting webhook returned 500")));
    ctx.webhooks.expect_confirm_reschedule().never();
    let server = ctx.server();

    let response = server
        .post("/api/visits/v-123/reschedule")
        .json(&json!({ "date": day, "time": "15:00" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_reschedule_rejects_unknown_slot_label() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/visits/v-123/reschedule")
        .json(&json!({ "date": days_from_today(10), "time": "18:00" }))
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_cancel_details_requires_verified_visit() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_lookup_visit()
        .withf(|visit_id: &str| visit_id == "v-123")
        .returning(|_| Ok(scheduled_visit()));
    ctx.webhooks
        .expect_lookup_visit()
        .withf(|visit_id: &str| visit_id == "v-999")
        .returning(|_| {
            Ok(VisitLookup {
                visit: Some("not-found".to_string()),
                ..VisitLookup::default()
            })
        });
    let server = ctx.server();

    let verified = server.get("/api/visits/v-123/cancel").await;
    verified.assert_status_ok();
    let body: CancelDetails = verified.json();
    assert_eq!(body.visit_date.as_deref(), Some("2099-01-15T10:00:00-05:00"));

    server
        .get("/api/visits/v-999/cancel")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_visit_notifies_patient() {
    let mut ctx = TestContext::new();
    let mut seq = Sequence::new();
    ctx.webhooks
        .expect_lookup_visit()
        .withf(|visit_id: &str| visit_id == "v-123")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(scheduled_visit()));
    ctx.webhooks
        .expect_cancel_meeting()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    ctx.webhooks
        .expect_notify_cancellation()
        .withf(|notice: &CancellationNotice| {
            notice.visit_id == "v-123"
                && notice.canceled
                && notice.canceled_by == "reception"
                && notice.cancellation_date.ends_with('Z')
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let server = ctx.server();

    let response = server
        .post("/api/visits/v-123/cancel")
        .json(&json!({ "canceled_by": "reception" }))
        .await;

    response.assert_status_ok();
    let body: CancelResponse = response.json();
    assert_eq!(body.visit_id, "v-123");
    assert!(body.canceled);
}

#[tokio::test]
async fn test_cancel_visit_with_unverified_id_is_not_found() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_lookup_visit()
        .returning(|_| Ok(VisitLookup::default()));
    ctx.webhooks.expect_cancel_meeting().never();
    ctx.webhooks.expect_notify_cancellation().never();
    let server = ctx.server();

    let response = server
        .post("/api/visits/forged/cancel")
        .json(&json!({ "canceled_by": "reception" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
