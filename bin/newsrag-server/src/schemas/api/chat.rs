use crate::schemas::api::message::MessageResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
    /// The stored user turn followed by the stored bot turn.
    pub messages: Vec<MessageResponse>,
}
