mod config;
mod db;
mod enrichment;
mod errors;
mod evaluation;
mod extraction;
mod index;
mod llm_client;
mod reader;
mod retrieval;
mod routes;
mod state;
mod validation;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, EmbeddingConfig};
use crate::db::{create_pool, PgMatchStore};
use crate::enrichment::PronounGenderClassifier;
use crate::extraction::{load_reference_example, ExtractionService, WhitespaceTokenizer};
use crate::index::{Embedder, HashEmbedder, HttpEmbedder, PgVectorStore, VectorIndex};
use crate::llm_client::LlmClient;
use crate::reader::{DocumentReader, FileDocumentReader};
use crate::retrieval::Retriever;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matcher v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (vector index + match persistence)
    let db = create_pool(&config.database_url).await?;

    let vector_store = PgVectorStore::new(db.clone());
    vector_store.ensure_schema().await?;
    let embedder = build_embedder(&config.embedding)?;
    let index = Arc::new(VectorIndex::new(
        Arc::new(vector_store),
        embedder,
        config.distance_metric,
    ));
    let jobs = index.get_or_create(&config.job_collection).await?;
    info!(
        "Job collection '{}' ready ({} postings, {} distance)",
        jobs.name, jobs.count, jobs.metric
    );

    let match_store = PgMatchStore::new(db);
    match_store.ensure_schema().await?;

    // Initialize LLM client and extraction
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let example = load_reference_example(config.example_resume_path.as_deref()).await?;
    let extractor = Arc::new(ExtractionService::new(
        llm,
        Arc::new(WhitespaceTokenizer),
        config.chunk_policy,
        &example,
    ));

    let reader: Arc<dyn DocumentReader> = Arc::new(FileDocumentReader);
    let retriever = Retriever::new(
        reader.clone(),
        extractor,
        config.max_retries,
        index.clone(),
        Arc::new(PronounGenderClassifier::new()?),
        config.job_collection.clone(),
    )
    .with_match_store(Arc::new(match_store));

    // Build app state
    let state = AppState {
        retriever: Arc::new(retriever),
        index,
        reader,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Feature hashing unless an embedding API is configured.
fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config {
        EmbeddingConfig::Hash { dimensions } => {
            info!("Using local hash embedder ({dimensions} dims)");
            Arc::new(HashEmbedder::new(*dimensions)?)
        }
        EmbeddingConfig::Http {
            api_key,
            base_url,
            model,
            dimensions,
        } => {
            let embedder = HttpEmbedder::new(api_key, base_url, model, *dimensions)?;
            info!("Using embedding API at {} (model: {model})", embedder.endpoint());
            Arc::new(embedder)
        }
    };
    Ok(embedder)
}
