use crate::entities::{
    AnyStore,
    dao::{MessageRecord, Role},
    format_timestamp, now, parse_timestamp,
};
use std::future::Future;

pub trait MessageStore: Send + Sync + 'static {
    fn append_message(
        &self,
        session_id: i64,
        role: Role,
        content: &str,
    ) -> impl Future<Output = Result<MessageRecord, sqlx::Error>> + Send;
    /// Messages of one session, oldest first.
    fn list_messages(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<Vec<MessageRecord>, sqlx::Error>> + Send;
    fn delete_messages(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl MessageStore for AnyStore {
    async fn append_message(
        &self,
        session_id: i64,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, sqlx::Error> {
        let created_at = now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO messages (session_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(format_timestamp(created_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(MessageRecord {
            id,
            session_id,
            role,
            content: content.to_owned(),
            created_at,
        })
    }

    async fn list_messages(&self, session_id: i64) -> Result<Vec<MessageRecord>, sqlx::Error> {
        let rows: Vec<(i64, i64, String, String, String)> = sqlx::query_as(
            "SELECT id, session_id, role, content, created_at \
             FROM messages WHERE session_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(id, session_id, role, content, created_at)| {
                let role = role
                    .parse::<Role>()
                    .map_err(|e| sqlx::Error::Decode(e.into()))?;
                Ok(MessageRecord {
                    id,
                    session_id,
                    role,
                    content,
                    created_at: parse_timestamp(&created_at),
                })
            })
            .collect()
    }

    async fn delete_messages(&self, session_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
