//! Provider and pipeline configuration.
//!
//! Every struct has a [`Default`] that matches the reference deployment
//! (Jina 768-d embeddings, Qdrant cosine collection `news_articles`, Gemini
//! flash, top-5 retrieval). The server fills these from environment
//! variables; tests construct them directly.

use std::time::Duration;

use crate::vector_index::Distance;

/// Settings for the HTTP embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Full URL of the embeddings endpoint.
    pub url: String,
    /// Bearer token sent in the `Authorization` header.
    pub api_key: String,
    pub model: String,
    /// Expected vector length; responses of any other length are rejected.
    pub dimension: usize,
    /// Inputs longer than this many characters are truncated before sending.
    pub max_chars: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "https://api.jina.ai/v1/embeddings".into(),
            api_key: String::new(),
            model: "jina-embeddings-v2-base-en".into(),
            dimension: 768,
            max_chars: 8000,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the Qdrant REST client.
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Base URL, e.g. `http://localhost:6333`.
    pub url: String,
    /// Optional `api-key` header for managed Qdrant.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the Gemini REST client.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// API base, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Extra attempts after the first one on transient failures. `0` disables retry.
    pub retries: usize,
    /// Delay before the first retry; doubled for each further attempt.
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: String::new(),
            model: "gemini-1.5-flash".into(),
            retries: 0,
            retry_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings shared by the orchestrator and the article indexer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub collection: String,
    pub dimension: usize,
    pub distance: Distance,
    /// Number of passages retrieved per query.
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection: "news_articles".into(),
            dimension: 768,
            distance: Distance::Cosine,
            top_k: 5,
        }
    }
}
