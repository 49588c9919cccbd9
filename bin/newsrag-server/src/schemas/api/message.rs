use crate::entities::{MessageRecord, format_timestamp};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    /// `"user"` or `"bot"`.
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub session_id: i64,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl MessageRecord {
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse {
            id: self.id,
            session_id: self.session_id,
            role: self.role.to_string(),
            content: self.content.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }
}
