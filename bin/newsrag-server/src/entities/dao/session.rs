use chrono::{DateTime, Utc};

/// A row in the `sessions` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: i64,
    /// Opaque token handed to clients; unique.
    pub session_token: String,
    pub created_at: DateTime<Utc>,
}
