use crate::entities::{ArticleRecord, format_timestamp};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub created_at: String,
}

impl ArticleRecord {
    pub fn to_response(&self) -> ArticleResponse {
        ArticleResponse {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            url: self.url.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }
}
