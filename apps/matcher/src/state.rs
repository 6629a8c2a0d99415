use std::sync::Arc;

use crate::config::Config;
use crate::index::VectorIndex;
use crate::reader::DocumentReader;
use crate::retrieval::Retriever;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    /// Same index the retriever queries; handlers use it for ingestion and
    /// collection management.
    pub index: Arc<VectorIndex>,
    /// Same reader the retriever uses; resume indexing reads through it.
    pub reader: Arc<dyn DocumentReader>,
    pub config: Config,
}
