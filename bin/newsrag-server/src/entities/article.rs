use crate::entities::{
    AnyStore,
    dao::{ArticleRecord, NewArticle},
    format_timestamp, now, parse_timestamp,
};
use std::future::Future;

type ArticleRow = (i64, String, String, Option<String>, String);

pub trait ArticleStore: Send + Sync + 'static {
    fn create_article(
        &self,
        article: NewArticle,
    ) -> impl Future<Output = Result<ArticleRecord, sqlx::Error>> + Send;
    /// All articles, newest first.
    fn list_articles(&self) -> impl Future<Output = Result<Vec<ArticleRecord>, sqlx::Error>> + Send;
    fn get_article(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ArticleRecord>, sqlx::Error>> + Send;
    /// Returns `false` when no row had that id.
    fn delete_article(&self, id: i64) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

fn from_row((id, title, content, url, created_at): ArticleRow) -> ArticleRecord {
    ArticleRecord {
        id,
        title,
        content,
        url,
        created_at: parse_timestamp(&created_at),
    }
}

impl ArticleStore for AnyStore {
    async fn create_article(&self, article: NewArticle) -> Result<ArticleRecord, sqlx::Error> {
        let created_at = now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO news_articles (title, content, url, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.url)
        .bind(format_timestamp(created_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(ArticleRecord {
            id,
            title: article.title,
            content: article.content,
            url: article.url,
            created_at,
        })
    }

    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, sqlx::Error> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            "SELECT id, title, content, url, created_at \
             FROM news_articles ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>, sqlx::Error> {
        let row: Option<ArticleRow> = sqlx::query_as(
            "SELECT id, title, content, url, created_at FROM news_articles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn delete_article(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM news_articles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::memory_store;

    fn new_article(title: &str, url: Option<&str>) -> NewArticle {
        NewArticle {
            title: title.into(),
            content: format!("{title} body"),
            url: url.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = memory_store().await;
        store.create_article(new_article("first", None)).await.unwrap();
        store
            .create_article(new_article("second", Some("https://news.example/2")))
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_articles()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[tokio::test]
    async fn get_and_delete_by_id() {
        let store = memory_store().await;
        let created = store
            .create_article(new_article("a", Some("https://news.example/a")))
            .await
            .unwrap();

        let fetched = store.get_article(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.url.as_deref(), Some("https://news.example/a"));

        assert!(store.delete_article(created.id).await.unwrap());
        assert!(!store.delete_article(created.id).await.unwrap());
        assert!(store.get_article(created.id).await.unwrap().is_none());
    }
}
