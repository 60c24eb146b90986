use std::sync::Arc;

use axum::{Json, extract::State};
use dentiro_core::{
    errors::ClinicError,
    models::chat::{ChatReply, ChatRequest},
};

use crate::{ApiState, middleware::error_handling::AppError};

/// Relays a message to the receptionist chatbot
///
/// # Endpoint
///
/// ```text
/// POST /api/chat
/// ```
pub async fn send_message(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if request.message.trim().is_empty() {
        return Err(ClinicError::Validation("Message cannot be empty".to_string()).into());
    }

    let reply = state.webhooks.send_chat(&request).await?;
    Ok(Json(reply))
}
