//! Durable store.
//!
//! Each table gets a store trait ([`SessionStore`], [`MessageStore`],
//! [`ArticleStore`]) implemented for [`AnyStore`], a `sqlx::Any` pool. The
//! history layer and the handlers are generic over the traits, so tests and
//! alternative databases only need a new implementation.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod article;
pub mod dao;
pub mod message;
pub mod session;

pub use dao::{ArticleRecord, MessageRecord, NewArticle, Role, SessionRecord};

pub use article::ArticleStore;
pub use message::MessageStore;
pub use session::SessionStore;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

#[derive(Clone, Debug)]
pub struct AnyStore {
    pool: sqlx::Pool<sqlx::Any>,
}

impl AnyStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible URL, e.g. `"sqlite://newsrag.db?mode=rwc"`
    /// or `"sqlite::memory:"` for tests (use `max_connections = 1` there, since
    /// every in-memory connection is its own database).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        sqlx::any::install_default_drivers();
        let options = sqlx::any::AnyConnectOptions::from_str(url)?;
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query to check the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text ordering equals time ordering.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, "failed to parse stored timestamp; using now");
        Utc::now()
    })
}

#[cfg(test)]
pub(crate) async fn memory_store() -> AnyStore {
    AnyStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite")
}
