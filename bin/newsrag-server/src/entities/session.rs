use crate::entities::{AnyStore, dao::SessionRecord, format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use std::future::Future;

pub trait SessionStore: Send + Sync + 'static {
    fn create_session(
        &self,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<SessionRecord, sqlx::Error>> + Send;
    fn find_session(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<SessionRecord>, sqlx::Error>> + Send;
    fn delete_session(&self, id: i64) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

impl SessionStore for AnyStore {
    async fn create_session(
        &self,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<SessionRecord, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO sessions (session_token, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(token)
        .bind(format_timestamp(created_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(SessionRecord {
            id,
            session_token: token.to_owned(),
            created_at,
        })
    }

    async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>, sqlx::Error> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT id, session_token, created_at FROM sessions WHERE session_token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, session_token, created_at)| SessionRecord {
            id,
            session_token,
            created_at: parse_timestamp(&created_at),
        }))
    }

    async fn delete_session(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
