//! In-process brute-force index.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use super::{ArticlePayload, Distance, IndexPoint, RetrievedPassage, VectorIndex};
use crate::error::VectorIndexError;

#[derive(Debug)]
struct Collection {
    dimension: usize,
    distance: Distance,
    points: BTreeMap<u64, (Vec<f32>, ArticlePayload)>,
}

/// A [`VectorIndex`] kept entirely in memory.
///
/// Scores follow Qdrant's conventions: cosine similarity and dot product are
/// "higher is closer", Euclidean distance is "lower is closer".
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points stored in `collection`, or `None` if it does not exist.
    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map(|c| c.points.len())
    }
}

impl VectorIndex for MemoryIndex {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), VectorIndexError> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = collections.get(collection) {
            if existing.dimension != dimension || existing.distance != distance {
                return Err(VectorIndexError::IncompatibleCollection {
                    collection: collection.to_owned(),
                    existing_size: existing.dimension,
                    existing_distance: existing.distance.to_string(),
                    requested_size: dimension,
                    requested_distance: distance.to_string(),
                });
            }
            return Ok(());
        }
        collections.insert(
            collection.to_owned(),
            Collection {
                dimension,
                distance,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), VectorIndexError> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorIndexError::MissingCollection(collection.to_owned()))?;
        if point.vector.len() != target.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: target.dimension,
                actual: point.vector.len(),
            });
        }
        target.points.insert(point.id, (point.vector, point.payload));
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, VectorIndexError> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorIndexError::MissingCollection(collection.to_owned()))?;
        if vector.len() != target.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: target.dimension,
                actual: vector.len(),
            });
        }

        let mut hits: Vec<RetrievedPassage> = target
            .points
            .iter()
            .map(|(id, (stored, payload))| RetrievedPassage {
                id: *id,
                score: score(target.distance, vector, stored),
                payload: payload.clone(),
            })
            .collect();

        let higher_is_better = target.distance.higher_is_better();
        hits.sort_by(|a, b| {
            let ord = a.score.total_cmp(&b.score);
            if higher_is_better { ord.reverse() } else { ord }
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Dot => dot(a, b),
        Distance::Cosine => {
            let norm = dot(a, a).sqrt() * dot(b, b).sqrt();
            if norm == 0.0 { 0.0 } else { dot(a, b) / norm }
        }
        Distance::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
