//! Nearest-neighbour index abstraction.
//!
//! [`VectorIndex`] covers the three operations the system needs: ensure a
//! collection exists with a given shape, upsert a point by stable id, and
//! run a top-k similarity search. Point ids are the durable article ids, so
//! re-indexing an article overwrites its point rather than adding a second
//! one.
//!
//! Two implementations ship:
//! - [`qdrant::QdrantIndex`]: Qdrant over its REST API.
//! - [`memory::MemoryIndex`]: an in-process brute-force index with the same
//!   semantics, used by tests and local runs without a Qdrant instance.

pub mod memory;
pub mod qdrant;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VectorIndexError;

pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;

/// Similarity metric of a collection.
///
/// Serialised with Qdrant's spelling (`"Cosine"`, `"Dot"`, `"Euclid"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
        }
    }

    /// `true` when a larger score means a closer match.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Distance::Euclid)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "dot" => Ok(Distance::Dot),
            "euclid" | "euclidean" => Ok(Distance::Euclid),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

/// Payload stored next to each vector: the article fields needed to build
/// a context block without going back to the durable store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticlePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A point to upsert.
#[derive(Debug, Clone, Serialize)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: ArticlePayload,
}

/// One search hit, ranked best-first by the index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievedPassage {
    pub id: u64,
    pub score: f32,
    #[serde(default)]
    pub payload: ArticlePayload,
}

pub trait VectorIndex: Send + Sync + 'static {
    /// Create `collection` if absent.
    ///
    /// An existing collection with the same dimension and distance is a
    /// success; one with different parameters is
    /// [`VectorIndexError::IncompatibleCollection`].
    fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        distance: Distance,
    ) -> impl Future<Output = Result<(), VectorIndexError>> + Send;

    /// Insert or replace the point with `point.id`.
    fn upsert(
        &self,
        collection: &str,
        point: IndexPoint,
    ) -> impl Future<Output = Result<(), VectorIndexError>> + Send;

    /// Up to `limit` nearest points, best first. An empty collection yields `[]`.
    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedPassage>, VectorIndexError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_parses_case_insensitively() {
        assert_eq!("cosine".parse::<Distance>(), Ok(Distance::Cosine));
        assert_eq!("DOT".parse::<Distance>(), Ok(Distance::Dot));
        assert_eq!("Euclidean".parse::<Distance>(), Ok(Distance::Euclid));
        assert!("manhattan".parse::<Distance>().is_err());
    }

    #[test]
    fn distance_serialises_with_qdrant_spelling() {
        assert_eq!(serde_json::to_string(&Distance::Cosine).unwrap(), "\"Cosine\"");
        assert_eq!(Distance::Euclid.to_string(), "Euclid");
    }

    #[test]
    fn passage_tolerates_partial_payload() {
        let hit: RetrievedPassage = serde_json::from_str(
            r#"{ "id": 7, "score": 0.9, "payload": { "title": "Only a title" } }"#,
        )
        .unwrap();
        assert_eq!(hit.payload.title, "Only a title");
        assert!(hit.payload.content.is_empty());
        assert_eq!(hit.payload.url, None);
    }
}
