//! Text → vector conversion.
//!
//! [`Embedder`] is the narrow contract the pipeline depends on. The shipped
//! implementation, [`JinaEmbedder`], talks to a Jina-compatible
//! `/v1/embeddings` endpoint with bearer auth. Failures are always returned
//! as an [`EmbeddingError`] so the caller can decide to skip (indexing) or
//! abort (answering); an embedder never yields an empty or short vector.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use crate::http::{build_client, check_status};

pub trait Embedder: Send + Sync + 'static {
    /// Embed `text` into a vector of exactly [`Embedder::dimension`] floats.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    fn dimension(&self) -> usize;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}

/// Jina embeddings client.
#[derive(Debug, Clone)]
pub struct JinaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl JinaEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }
}

impl Embedder for JinaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        let input = truncate_chars(text, self.config.max_chars);
        if input.len() < text.len() {
            debug!(
                original_len = text.len(),
                truncated_len = input.len(),
                "embedding input truncated"
            );
        }

        let resp = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&EmbedRequest {
                model: &self.config.model,
                input: [input],
            })
            .send()
            .await?;

        let resp = check_status(resp).await.map_err(|(status, body)| {
            warn!(status, body = %body, "embedding provider rejected request");
            EmbeddingError::Status { status, body }
        })?;

        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Malformed("response has no data entries".into()))?;

        if vector.len() != self.config.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Cut `text` to at most `max_chars` characters without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(server: &MockServer, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            url: server.url("/v1/embeddings"),
            api_key: "test-key".into(),
            model: "test-model".into(),
            dimension,
            max_chars: 16,
            ..Default::default()
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[tokio::test]
    async fn returns_vector_and_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({ "model": "test-model", "input": ["markets rally"] }));
                then.status(200)
                    .json_body(json!({ "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3] }] }));
            })
            .await;

        let embedder = JinaEmbedder::new(config_for(&server, 3)).unwrap();
        let vector = embedder.embed("  markets rally ").await.unwrap();

        mock.assert_async().await;
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn long_input_is_truncated_before_sending() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .json_body(json!({ "model": "test-model", "input": ["abcdefghijklmnop"] }));
                then.status(200)
                    .json_body(json!({ "data": [{ "embedding": [1.0, 0.0] }] }));
            })
            .await;

        let embedder = JinaEmbedder::new(config_for(&server, 2)).unwrap();
        embedder.embed("abcdefghijklmnopqrstuvwxyz").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_error_status_is_distinguishable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(401).body("invalid api key");
            })
            .await;

        let embedder = JinaEmbedder::new(config_for(&server, 3)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(
            matches!(err, EmbeddingError::Status { status: 401, ref body } if body == "invalid api key"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .json_body(json!({ "data": [{ "embedding": [0.5, 0.5] }] }));
            })
            .await;

        let embedder = JinaEmbedder::new(config_for(&server, 768)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { expected: 768, actual: 2 }
        ));
    }

    #[tokio::test]
    async fn missing_data_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let embedder = JinaEmbedder::new(config_for(&server, 3)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn blank_input_fails_without_a_request() {
        let embedder = JinaEmbedder::new(EmbeddingConfig::default()).unwrap();
        let err = embedder.embed("   ").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }
}
