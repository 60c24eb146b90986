use axum::http::StatusCode;
use dentiro_core::models::chat::{ChatReply, ChatRequest};
use eyre::eyre;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::TestContext;

#[test_log::test(tokio::test)]
async fn test_chat_relays_message() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_send_chat()
        .withf(|request: &ChatRequest| {
            request.message == "Êtes-vous ouverts samedi?"
                && request.conversation_id.as_deref() == Some("c-1")
        })
        .times(1)
        .returning(|_| {
            Ok(ChatReply {
                conversation_id: Some("c-1".to_string()),
                response: "Nous sommes fermés le samedi.".to_string(),
            })
        });
    let server = ctx.server();

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "Êtes-vous ouverts samedi?", "conversation_id": "c-1" }))
        .await;

    response.assert_status_ok();
    let body: ChatReply = response.json();
    assert_eq!(body.response, "Nous sommes fermés le samedi.");
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let mut ctx = TestContext::new();
    ctx.webhooks.expect_send_chat().never();
    let server = ctx.server();

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_upstream_failure_is_bad_gateway() {
    let mut ctx = TestContext::new();
    ctx.webhooks
        .expect_send_chat()
        .returning(|_| Err(eyre!("chatbot webhook returned 504")));
    let server = ctx.server();

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "Bonjour" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}
