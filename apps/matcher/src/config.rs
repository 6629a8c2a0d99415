use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::extraction::ChunkPolicy;
use crate::index::embedder::DEFAULT_DIMENSIONS;
use crate::index::DistanceMetric;
use crate::validation::DEFAULT_MAX_RETRIES;

const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Which embedding backend the vector index uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingConfig {
    /// Local feature hashing; used when no embedding API key is set.
    Hash { dimensions: usize },
    Http {
        api_key: String,
        base_url: String,
        model: String,
        dimensions: usize,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Backs both the vector index (pgvector) and match persistence.
    pub database_url: String,
    pub job_collection: String,
    pub resume_collection: String,
    pub distance_metric: DistanceMetric,
    pub chunk_policy: ChunkPolicy,
    pub max_retries: u32,
    pub worker_count: usize,
    pub embedding: EmbeddingConfig,
    /// Reference corpus file supplying the worked extraction example.
    pub example_resume_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_chunk_size = parse_or(&get, "MAX_CHUNK_SIZE", 1024usize)?;
        let chunk_overlap = get("CHUNK_OVERLAP")
            .map(|v| parse_value::<usize>("CHUNK_OVERLAP", &v))
            .transpose()?;
        let chunk_policy = ChunkPolicy::from_settings(max_chunk_size, chunk_overlap)
            .context("Invalid MAX_CHUNK_SIZE / CHUNK_OVERLAP")?;

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let worker_count = parse_or(&get, "WORKER_COUNT", default_workers)?;
        anyhow::ensure!(worker_count > 0, "WORKER_COUNT must be at least 1");

        let dimensions = parse_or(&get, "EMBEDDING_DIM", DEFAULT_DIMENSIONS)?;
        anyhow::ensure!(dimensions > 0, "EMBEDDING_DIM must be at least 1");
        let embedding = match get("EMBEDDING_API_KEY") {
            Some(api_key) => EmbeddingConfig::Http {
                api_key,
                base_url: get("EMBEDDING_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_BASE_URL.to_string()),
                model: get("EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                dimensions,
            },
            None => EmbeddingConfig::Hash { dimensions },
        };

        Ok(Config {
            anthropic_api_key: require(&get, "ANTHROPIC_API_KEY")?,
            port: parse_or(&get, "PORT", 8080u16)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: require(&get, "DATABASE_URL")?,
            job_collection: get("JOB_COLLECTION").unwrap_or_else(|| "job_postings".to_string()),
            resume_collection: get("RESUME_COLLECTION").unwrap_or_else(|| "resumes".to_string()),
            distance_metric: parse_or(&get, "DISTANCE_METRIC", DistanceMetric::Cosine)?,
            chunk_policy,
            max_retries: parse_or(&get, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            worker_count,
            embedding,
            example_resume_path: get("EXAMPLE_RESUME_PATH").map(PathBuf::from),
        })
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}"))
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
