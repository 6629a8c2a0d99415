// Vector Index: embedding backends, distance metrics, metadata encoding, the
// collection facade and its pgvector storage backend.

use thiserror::Error;

pub mod embedder;
#[cfg(test)]
pub mod memory;
pub mod metadata;
pub mod metric;
pub mod pg_store;
pub mod store;

pub use embedder::{Embedder, HashEmbedder, HttpEmbedder};
pub use metric::DistanceMetric;
pub use pg_store::PgVectorStore;
pub use store::{MatchResult, NewDocument, VectorIndex};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Invalid collection name '{0}': use 1-64 ASCII letters, digits, '_' or '-'")]
    InvalidCollectionName(String),

    #[error("Unsupported distance metric '{0}' (expected 'cosine' or 'l2')")]
    UnsupportedMetric(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Index encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Embedding HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
