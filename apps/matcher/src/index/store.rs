//! Vector Index: named collections of embedded documents with k-nearest queries.
//!
//! `VectorIndex` owns the embedder and the id/score conventions; a
//! `VectorStore` backend owns rows and ranking. Backends assign ids
//! `id_{next}` atomically per collection, so concurrent inserts never reuse one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::index::embedder::Embedder;
use crate::index::metadata::{decode_metadata, encode_metadata, StoredMetadata};
use crate::index::metric::DistanceMetric;
use crate::index::IndexError;

const MAX_COLLECTION_NAME_LEN: usize = 64;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A document waiting to be embedded and inserted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// A document as handed to a backend: embedded, metadata encoded.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: StoredMetadata,
}

/// A stored document and its distance from a query vector.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub id: String,
    pub text: String,
    pub metadata: StoredMetadata,
    pub distance: f32,
}

/// One query hit. Field names are the wire format downstream consumers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "page_content")]
    pub text: String,
    pub metadata: Map<String, Value>,
    pub similarity_score: f32,
    pub chunk_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub metric: DistanceMetric,
    pub count: usize,
    /// Vector length, fixed by the first insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Storage backend
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Fails with `CollectionExists` when the name is taken.
    async fn create_collection(
        &self,
        name: &str,
        metric: DistanceMetric,
    ) -> Result<CollectionInfo, IndexError>;

    async fn collection(&self, name: &str) -> Result<CollectionInfo, IndexError>;

    /// Removes the collection and every document in it.
    async fn delete_collection(&self, name: &str) -> Result<(), IndexError>;

    /// Inserts all documents or none, returning their ids in input order.
    /// Every vector must match the collection's dimensions.
    async fn insert(
        &self,
        name: &str,
        documents: Vec<EmbeddedDocument>,
    ) -> Result<Vec<String>, IndexError>;

    /// The `k` closest documents under `metric`, closest first.
    async fn nearest(
        &self,
        name: &str,
        metric: DistanceMetric,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<Neighbor>, IndexError>;
}

// ────────────────────────────────────────────────────────────────────────────
// VectorIndex
// ────────────────────────────────────────────────────────────────────────────

pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    /// Metric for collections created from now on.
    metric: DistanceMetric,
}

impl VectorIndex {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            store,
            embedder,
            metric,
        }
    }

    pub async fn create(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        validate_name(name)?;
        let info = self.store.create_collection(name, self.metric).await?;
        info!("Created collection '{name}' ({})", info.metric);
        Ok(info)
    }

    pub async fn get(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        self.store.collection(name).await
    }

    pub async fn get_or_create(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        match self.create(name).await {
            Err(IndexError::CollectionExists(_)) => self.get(name).await,
            other => other,
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), IndexError> {
        self.store.delete_collection(name).await?;
        info!("Deleted collection '{name}'");
        Ok(())
    }

    /// Embeds and inserts `documents`, returning their ids in input order.
    /// On any failure nothing is inserted.
    pub async fn add(
        &self,
        name: &str,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<String>, IndexError> {
        self.store.collection(name).await?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(IndexError::Embedding(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                texts.len()
            )));
        }
        let expected = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let embedded = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| {
                encode_metadata(&document.metadata).map(|metadata| EmbeddedDocument {
                    text: document.text,
                    embedding,
                    metadata,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ids = self.store.insert(name, embedded).await?;
        debug!("Inserted {} document(s) into '{name}'", ids.len());
        Ok(ids)
    }

    /// The `k` nearest documents to `text`, closest first.
    pub async fn query(
        &self,
        name: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<MatchResult>, IndexError> {
        let info = self.store.collection(name).await?;
        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::Embedding("embedder returned no vector".to_string()))?;
        if let Some(expected) = info.dimensions {
            if query.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let neighbors = self.store.nearest(name, info.metric, &query, k).await?;
        Ok(neighbors
            .into_iter()
            .map(|neighbor| MatchResult {
                metadata: decode_metadata(&neighbor.metadata),
                similarity_score: info.metric.score(neighbor.distance),
                text: neighbor.text,
                chunk_id: neighbor.id,
            })
            .collect())
    }
}

fn validate_name(name: &str) -> Result<(), IndexError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(IndexError::InvalidCollectionName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::index::embedder::HashEmbedder;

    fn index(metric: DistanceMetric) -> VectorIndex {
        VectorIndex::in_memory(Arc::new(HashEmbedder::new(128).unwrap()), metric)
    }

    fn docs(texts: &[&str]) -> Vec<NewDocument> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| NewDocument {
                text: text.to_string(),
                metadata: json!({"idx": i}).as_object().cloned().unwrap(),
            })
            .collect()
    }

    const POSTINGS: [&str; 4] = [
        "Senior Rust engineer building distributed storage systems in Berlin",
        "Pastry chef for a sourdough bakery in Lyon",
        "Data analyst with SQL and dashboard experience in Toronto",
        "Kindergarten teacher with early childhood certification",
    ];

    #[tokio::test]
    async fn test_near_duplicate_ranks_first() {
        let index = index(DistanceMetric::Cosine);
        index.create("jobs").await.unwrap();
        index.add("jobs", docs(&POSTINGS)).await.unwrap();

        let hits = index
            .query("jobs", "senior RUST engineer, building distributed storage systems in berlin!", 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "id_0");
        assert!((hits[0].similarity_score - 1.0).abs() <= 0.01);
        assert!(hits[0].similarity_score >= hits[1].similarity_score);
        assert_eq!(hits[0].metadata["idx"], 0);
        assert_eq!(hits[0].text, POSTINGS[0]);
    }

    #[tokio::test]
    async fn test_exact_match_scores_one_under_both_metrics() {
        for metric in [DistanceMetric::Cosine, DistanceMetric::L2] {
            let index = index(metric);
            index.create("jobs").await.unwrap();
            index.add("jobs", docs(&POSTINGS)).await.unwrap();

            let hits = index.query("jobs", POSTINGS[2], 1).await.unwrap();

            assert_eq!(hits[0].chunk_id, "id_2");
            assert_eq!(hits[0].similarity_score, 1.0, "{metric}");
        }
    }

    #[tokio::test]
    async fn test_two_batches_get_distinct_ids() {
        let index = index(DistanceMetric::Cosine);
        index.create("jobs").await.unwrap();

        let first = index.add("jobs", docs(&POSTINGS[..2])).await.unwrap();
        let second = index.add("jobs", docs(&POSTINGS[2..])).await.unwrap();

        assert_eq!(first, vec!["id_0", "id_1"]);
        assert_eq!(second, vec!["id_2", "id_3"]);
        assert_eq!(index.get("jobs").await.unwrap().count, 4);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_never_collide() {
        let index = Arc::new(index(DistanceMetric::Cosine));
        index.create("jobs").await.unwrap();

        let mut handles = Vec::new();
        for task in 0..8 {
            let index = index.clone();
            handles.push(tokio::spawn(async move {
                let texts: Vec<String> = (0..5).map(|i| format!("posting {task} {i}")).collect();
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                index.add("jobs", docs(&refs)).await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.extend(handle.await.unwrap());
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 40);
        assert_eq!(index.get("jobs").await.unwrap().count, 40);
    }

    #[tokio::test]
    async fn test_k_larger_than_collection_returns_all() {
        let index = index(DistanceMetric::L2);
        index.create("jobs").await.unwrap();
        index.add("jobs", docs(&POSTINGS[..3])).await.unwrap();

        assert_eq!(index.query("jobs", "rust", 10).await.unwrap().len(), 3);
        assert!(index.query("jobs", "rust", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_metadata_round_trips() {
        let index = index(DistanceMetric::Cosine);
        index.create("jobs").await.unwrap();
        let doc = NewDocument {
            text: "Rust engineer".to_string(),
            metadata: json!({"keys": ["rust", "tokio"], "job": "Acme"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        index.add("jobs", vec![doc]).await.unwrap();

        let hits = index.query("jobs", "Rust engineer", 1).await.unwrap();

        assert_eq!(hits[0].metadata["keys"], json!(["rust", "tokio"]));
        assert_eq!(hits[0].metadata["job"], "Acme");
    }

    #[tokio::test]
    async fn test_collection_lifecycle_errors() {
        let index = index(DistanceMetric::Cosine);

        assert!(matches!(index.get("jobs").await, Err(IndexError::CollectionNotFound(_))));
        index.create("jobs").await.unwrap();
        assert!(matches!(index.create("jobs").await, Err(IndexError::CollectionExists(_))));
        assert_eq!(index.get_or_create("jobs").await.unwrap().count, 0);
        assert!(matches!(
            index.create("../escape").await,
            Err(IndexError::InvalidCollectionName(_))
        ));

        index.delete("jobs").await.unwrap();
        assert!(matches!(index.get("jobs").await, Err(IndexError::CollectionNotFound(_))));
        assert!(matches!(index.delete("jobs").await, Err(IndexError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_and_nothing_inserted() {
        let index = index(DistanceMetric::Cosine);
        index.create("jobs").await.unwrap();

        let result = index.add("jobs", docs(&["valid posting", ""])).await;

        assert!(matches!(result, Err(IndexError::Embedding(_))));
        assert_eq!(index.get("jobs").await.unwrap().count, 0);
    }

    struct FixedEmbedder(usize);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
            Ok(texts.iter().map(|_| vec![1.0; self.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_first_insert_fixes_dimensions() {
        let index = index(DistanceMetric::Cosine);
        let info = index.create("jobs").await.unwrap();
        assert_eq!(info.dimensions, None);

        index.add("jobs", docs(&POSTINGS[..1])).await.unwrap();

        assert_eq!(index.get("jobs").await.unwrap().dimensions, Some(128));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let index = VectorIndex::in_memory(Arc::new(FixedEmbedder(3)), DistanceMetric::Cosine);
        index.create("jobs").await.unwrap();

        let result = index.add("jobs", docs(&["posting"])).await;

        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 4, actual: 3 })
        ));
        assert_eq!(index.get("jobs").await.unwrap().count, 0);
    }
}
