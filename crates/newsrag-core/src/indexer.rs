//! Bulk embedding of articles into the vector index.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::embedding::Embedder;
use crate::error::VectorIndexError;
use crate::vector_index::{ArticlePayload, IndexPoint, VectorIndex};

/// An article as handed to the indexer. `id` becomes the point id.
#[derive(Debug, Clone)]
pub struct IndexableArticle {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    /// Ids of articles whose embedding failed.
    pub skipped: Vec<u64>,
}

pub struct ArticleIndexer<E, V> {
    embedder: Arc<E>,
    index: Arc<V>,
    config: PipelineConfig,
}

impl<E, V> ArticleIndexer<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(embedder: Arc<E>, index: Arc<V>, config: PipelineConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub async fn ensure_collection(&self) -> Result<(), VectorIndexError> {
        self.index
            .ensure_collection(
                &self.config.collection,
                self.config.dimension,
                self.config.distance,
            )
            .await
    }

    /// Ensure the collection, then embed each article's content and upsert it.
    ///
    /// An article whose embedding fails is skipped with a warning; an upsert
    /// failure aborts the run. Running twice over the same articles leaves one
    /// point per article.
    pub async fn index_all(
        &self,
        articles: impl IntoIterator<Item = IndexableArticle>,
    ) -> Result<IndexReport, VectorIndexError> {
        self.ensure_collection().await?;

        let mut report = IndexReport::default();
        for article in articles {
            let vector = match self.embedder.embed(&article.content).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(article_id = article.id, error = %e, "skipping article: embedding failed");
                    report.skipped.push(article.id);
                    continue;
                }
            };
            self.index
                .upsert(
                    &self.config.collection,
                    IndexPoint {
                        id: article.id,
                        vector,
                        payload: ArticlePayload {
                            title: article.title,
                            content: article.content,
                            url: article.url,
                        },
                    },
                )
                .await?;
            report.indexed += 1;
        }

        info!(
            collection = %self.config.collection,
            indexed = report.indexed,
            skipped = report.skipped.len(),
            "article indexing finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::KeywordEmbedder;
    use crate::vector_index::{Distance, MemoryIndex};
    use tracing_test::traced_test;

    fn article(id: u64, title: &str, content: &str) -> IndexableArticle {
        IndexableArticle {
            id,
            title: title.into(),
            content: content.into(),
            url: Some(format!("https://news.example/{id}")),
        }
    }

    fn indexer(index: Arc<MemoryIndex>) -> ArticleIndexer<KeywordEmbedder, MemoryIndex> {
        ArticleIndexer::new(
            Arc::new(KeywordEmbedder),
            index,
            PipelineConfig {
                collection: "news".into(),
                dimension: 3,
                distance: Distance::Cosine,
                top_k: 5,
            },
        )
    }

    #[tokio::test]
    async fn reindexing_keeps_one_point_per_article() {
        let index = Arc::new(MemoryIndex::new());
        let indexer = indexer(index.clone());
        let articles = vec![
            article(1, "Results", "Election votes counted."),
            article(2, "Sport", "Football cup final tonight."),
        ];

        let first = indexer.index_all(articles.clone()).await.unwrap();
        let second = indexer.index_all(articles).await.unwrap();

        assert_eq!(first.indexed, 2);
        assert_eq!(second.indexed, 2);
        assert_eq!(index.point_count("news"), Some(2));
    }

    #[tokio::test]
    #[traced_test]
    async fn embedding_failures_are_skipped_and_logged() {
        let index = Arc::new(MemoryIndex::new());
        let report = indexer(index.clone())
            .index_all(vec![
                article(1, "Forecast", "Sunny weather."),
                article(2, "Rejected", "Unembeddable body text."),
                article(3, "Politics", "Election recount."),
            ])
            .await
            .unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, vec![2]);
        assert_eq!(index.point_count("news"), Some(2));
        assert!(logs_contain("skipping article"));
    }

    #[tokio::test]
    async fn incompatible_collection_aborts() {
        let index = Arc::new(MemoryIndex::new());
        index.ensure_collection("news", 5, Distance::Dot).await.unwrap();
        let err = indexer(index)
            .index_all(vec![article(1, "Weather", "Rain.")])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorIndexError::IncompatibleCollection { .. }));
    }
}
