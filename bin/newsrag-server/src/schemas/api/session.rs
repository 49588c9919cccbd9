use crate::cache::CachedEntry;
use crate::entities::{SessionRecord, format_timestamp};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartResponse {
    pub session_token: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    /// `"user"` or `"bot"`.
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryResponse {
    pub session_token: String,
    pub messages: Vec<HistoryEntryResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionClearedResponse {
    pub message: String,
}

impl SessionRecord {
    pub fn to_response(&self) -> SessionStartResponse {
        SessionStartResponse {
            session_token: self.session_token.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }
}

impl CachedEntry {
    pub fn to_response(&self) -> HistoryEntryResponse {
        HistoryEntryResponse {
            role: self.role.to_string(),
            content: self.content.clone(),
            created_at: self.created_at.clone(),
        }
    }
}
