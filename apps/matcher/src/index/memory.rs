//! In-process `VectorStore` for tests: one map behind an async mutex, ranked by
//! brute-force distance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::index::embedder::Embedder;
use crate::index::metric::DistanceMetric;
use crate::index::store::{CollectionInfo, EmbeddedDocument, Neighbor, VectorIndex, VectorStore};
use crate::index::IndexError;

impl VectorIndex {
    pub fn in_memory(embedder: Arc<dyn Embedder>, metric: DistanceMetric) -> Self {
        VectorIndex::new(Arc::new(MemoryStore::default()), embedder, metric)
    }
}

/// Cosine distance is `1 - cos(a, b)`; a zero vector is at distance 1.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
            }
        }
        DistanceMetric::L2 => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

struct Collection {
    metric: DistanceMetric,
    next_id: u64,
    dimensions: Option<usize>,
    documents: Vec<(String, EmbeddedDocument)>,
}

impl Collection {
    fn info(&self, name: &str) -> CollectionInfo {
        CollectionInfo {
            name: name.to_string(),
            metric: self.metric,
            count: self.documents.len(),
            dimensions: self.dimensions,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

fn not_found(name: &str) -> IndexError {
    IndexError::CollectionNotFound(name.to_string())
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn create_collection(
        &self,
        name: &str,
        metric: DistanceMetric,
    ) -> Result<CollectionInfo, IndexError> {
        let mut collections = self.collections.lock().await;
        if collections.contains_key(name) {
            return Err(IndexError::CollectionExists(name.to_string()));
        }
        let collection = Collection {
            metric,
            next_id: 0,
            dimensions: None,
            documents: Vec::new(),
        };
        let info = collection.info(name);
        collections.insert(name.to_string(), collection);
        Ok(info)
    }

    async fn collection(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        let collections = self.collections.lock().await;
        collections
            .get(name)
            .map(|c| c.info(name))
            .ok_or_else(|| not_found(name))
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        let mut collections = self.collections.lock().await;
        collections.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
    }

    async fn insert(
        &self,
        name: &str,
        documents: Vec<EmbeddedDocument>,
    ) -> Result<Vec<String>, IndexError> {
        let mut collections = self.collections.lock().await;
        let collection = collections.get_mut(name).ok_or_else(|| not_found(name))?;
        let Some(first) = documents.first() else {
            return Ok(Vec::new());
        };

        let expected = collection.dimensions.unwrap_or(first.embedding.len());
        if let Some(bad) = documents.iter().find(|d| d.embedding.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: bad.embedding.len(),
            });
        }

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let id = format!("id_{}", collection.next_id);
            collection.next_id += 1;
            collection.documents.push((id.clone(), document));
            ids.push(id);
        }
        collection.dimensions = Some(expected);
        Ok(ids)
    }

    async fn nearest(
        &self,
        name: &str,
        metric: DistanceMetric,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<Neighbor>, IndexError> {
        let collections = self.collections.lock().await;
        let collection = collections.get(name).ok_or_else(|| not_found(name))?;

        let mut ranked: Vec<(f32, &(String, EmbeddedDocument))> = collection
            .documents
            .iter()
            .map(|entry| (distance(metric, query, &entry.1.embedding), entry))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(distance, (id, document))| Neighbor {
                id: id.clone(),
                text: document.text.clone(),
                metadata: document.metadata.clone(),
                distance,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_are_at_distance_zero() {
        let v = [0.6, 0.8, 0.0];
        assert!(distance(DistanceMetric::Cosine, &v, &v).abs() < 1e-6);
        assert_eq!(distance(DistanceMetric::L2, &v, &v), 0.0);
    }

    #[test]
    fn test_zero_vector_has_cosine_distance_one() {
        assert_eq!(distance(DistanceMetric::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
