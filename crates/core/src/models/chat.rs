use serde::{Deserialize, Serialize};

/// Message relayed to the receptionist chatbot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Chatbot answer, with the id to continue the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub response: String,
}
