//! Qdrant REST client.
//!
//! Endpoints used:
//! - `PUT  /collections/{name}`: create (409 when it already exists)
//! - `GET  /collections/{name}`: read back params to check compatibility
//! - `PUT  /collections/{name}/points?wait=true`: upsert
//! - `POST /collections/{name}/points/search`: similarity search

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Distance, IndexPoint, RetrievedPassage, VectorIndex};
use crate::config::VectorIndexConfig;
use crate::error::VectorIndexError;
use crate::http::{build_client, check_status};

#[derive(Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: Distance,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: [&'a IndexPoint; 1],
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<RetrievedPassage>,
}

#[derive(Debug, Clone)]
pub struct QdrantIndex {
    client: Client,
    config: VectorIndexConfig,
}

impl QdrantIndex {
    pub fn new(config: VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }

    async fn collection_params(&self, collection: &str) -> Result<VectorParams, VectorIndexError> {
        let resp = self
            .authorize(self.client.get(self.url(&format!("/collections/{collection}"))))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(VectorIndexError::MissingCollection(collection.to_owned()));
        }
        let resp = check_status(resp)
            .await
            .map_err(|(status, body)| VectorIndexError::Status { status, body })?;
        let info: CollectionInfoResponse = resp
            .json()
            .await
            .map_err(|e| VectorIndexError::Malformed(e.to_string()))?;
        Ok(info.result.config.params.vectors)
    }
}

impl VectorIndex for QdrantIndex {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), VectorIndexError> {
        let body = CreateCollection {
            vectors: VectorParams { size: dimension, distance },
        };
        let resp = self
            .authorize(self.client.put(self.url(&format!("/collections/{collection}"))))
            .json(&body)
            .send()
            .await?;

        if resp.status() != StatusCode::CONFLICT {
            check_status(resp)
                .await
                .map_err(|(status, body)| VectorIndexError::Status { status, body })?;
            info!(collection, dimension, %distance, "collection created");
            return Ok(());
        }

        let existing = self.collection_params(collection).await?;
        if existing.size != dimension || existing.distance != distance {
            return Err(VectorIndexError::IncompatibleCollection {
                collection: collection.to_owned(),
                existing_size: existing.size,
                existing_distance: existing.distance.to_string(),
                requested_size: dimension,
                requested_distance: distance.to_string(),
            });
        }
        debug!(collection, "collection already exists");
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), VectorIndexError> {
        let resp = self
            .authorize(
                self.client
                    .put(self.url(&format!("/collections/{collection}/points?wait=true"))),
            )
            .json(&UpsertPoints { points: [&point] })
            .send()
            .await?;
        check_status(resp)
            .await
            .map_err(|(status, body)| VectorIndexError::Status { status, body })?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, VectorIndexError> {
        let resp = self
            .authorize(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points/search"))),
            )
            .json(&SearchRequest {
                vector,
                limit,
                with_payload: true,
            })
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(VectorIndexError::MissingCollection(collection.to_owned()));
        }
        let resp = check_status(resp)
            .await
            .map_err(|(status, body)| VectorIndexError::Status { status, body })?;
        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| VectorIndexError::Malformed(e.to_string()))?;
        Ok(parsed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::ArticlePayload;
    use httpmock::prelude::*;
    use serde_json::json;

    fn index_for(server: &MockServer) -> QdrantIndex {
        QdrantIndex::new(VectorIndexConfig {
            url: server.base_url(),
            api_key: Some("secret".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn collection_info(size: usize, distance: &str) -> serde_json::Value {
        json!({
            "result": { "config": { "params": { "vectors": { "size": size, "distance": distance } } } },
            "status": "ok"
        })
    }

    #[tokio::test]
    async fn creates_missing_collection() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/news_articles")
                    .header("api-key", "secret")
                    .json_body(json!({ "vectors": { "size": 768, "distance": "Cosine" } }));
                then.status(200).json_body(json!({ "result": true, "status": "ok" }));
            })
            .await;

        index_for(&server)
            .ensure_collection("news_articles", 768, Distance::Cosine)
            .await
            .unwrap();
        create.assert_async().await;
    }

    #[tokio::test]
    async fn conflict_with_same_params_is_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/news_articles");
                then.status(409).body("collection already exists");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/news_articles");
                then.status(200).json_body(collection_info(768, "Cosine"));
            })
            .await;

        index_for(&server)
            .ensure_collection("news_articles", 768, Distance::Cosine)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn conflict_with_other_params_is_a_configuration_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/news_articles");
                then.status(409).body("collection already exists");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/news_articles");
                then.status(200).json_body(collection_info(384, "Dot"));
            })
            .await;

        let err = index_for(&server)
            .ensure_collection("news_articles", 768, Distance::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorIndexError::IncompatibleCollection { existing_size: 384, requested_size: 768, .. }
        ));
    }

    #[tokio::test]
    async fn upsert_sends_stable_id_and_payload() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/news_articles/points")
                    .json_body(json!({
                        "points": [{
                            "id": 42,
                            "vector": [1.0, 0.0],
                            "payload": { "title": "T", "content": "C", "url": "https://example.com/a" }
                        }]
                    }));
                then.status(200)
                    .json_body(json!({ "result": { "status": "completed" }, "status": "ok" }));
            })
            .await;

        index_for(&server)
            .upsert(
                "news_articles",
                IndexPoint {
                    id: 42,
                    vector: vec![1.0, 0.0],
                    payload: ArticlePayload {
                        title: "T".into(),
                        content: "C".into(),
                        url: Some("https://example.com/a".into()),
                    },
                },
            )
            .await
            .unwrap();
        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn search_parses_ranked_hits() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/news_articles/points/search")
                    .json_body(json!({ "vector": [0.5, 0.5], "limit": 5, "with_payload": true }));
                then.status(200).json_body(json!({
                    "result": [
                        { "id": 3, "version": 1, "score": 0.92, "payload": { "title": "A", "content": "a", "url": null } },
                        { "id": 9, "version": 1, "score": 0.41, "payload": { "title": "B", "content": "b", "url": "u" } }
                    ],
                    "status": "ok"
                }));
            })
            .await;

        let hits = index_for(&server)
            .search("news_articles", &[0.5, 0.5], 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 3);
        assert_eq!(hits[1].payload.url.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn search_on_empty_collection_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/news_articles/points/search");
                then.status(200).json_body(json!({ "result": [], "status": "ok" }));
            })
            .await;

        let hits = index_for(&server)
            .search("news_articles", &[0.5, 0.5], 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_on_missing_collection_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/nope/points/search");
                then.status(404).body("Not found: Collection `nope` doesn't exist!");
            })
            .await;

        let err = index_for(&server).search("nope", &[0.5], 5).await.unwrap_err();
        assert!(matches!(err, VectorIndexError::MissingCollection(ref c) if c == "nope"));
    }
}
