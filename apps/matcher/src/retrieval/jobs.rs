//! Job posting ingestion: CSV rows to embedded passages in the job collection.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::errors::{InputError, PipelineError};
use crate::index::{NewDocument, VectorIndex};

const REQUIRED_COLUMNS: [&str; 4] = ["job", "position", "location", "description"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Zero-based row number in the source file.
    #[serde(skip_deserializing)]
    pub idx: usize,
    pub job: String,
    pub position: String,
    pub location: String,
    pub description: String,
}

impl JobPosting {
    /// The passage that gets embedded and returned as `page_content`.
    pub fn composed_text(&self) -> String {
        format!(
            "Job: {}\nPosition: {}\nLocation: {}\nJob Description: {}",
            self.job, self.position, self.location, self.description
        )
    }

    /// `offset` is the collection size before this file was ingested, so `idx`
    /// keeps counting across files instead of restarting at zero.
    fn metadata(&self, offset: usize) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("idx".to_string(), json!(offset + self.idx));
        metadata.insert("job".to_string(), json!(self.job));
        metadata.insert("position".to_string(), json!(self.position));
        metadata.insert("location".to_string(), json!(self.location));
        metadata
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub inserted: usize,
    pub ids: Vec<String>,
}

/// Parses postings from CSV text. Extra columns are ignored; missing required
/// columns are an error.
pub fn parse_job_postings(bytes: &[u8], path: &Path) -> Result<Vec<JobPosting>, InputError> {
    let csv_error = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(InputError::Format {
            path: path.to_path_buf(),
            message: format!("missing column(s): {}", missing.join(", ")),
        });
    }

    reader
        .deserialize::<JobPosting>()
        .enumerate()
        .map(|(idx, row)| row.map(|posting| JobPosting { idx, ..posting }).map_err(csv_error))
        .collect()
}

pub async fn load_job_postings(path: &Path) -> Result<Vec<JobPosting>, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_job_postings(&bytes, path)
}

/// Loads every posting in `path` into `collection`, creating it if needed.
pub async fn ingest_job_postings(
    index: &VectorIndex,
    collection: &str,
    path: &Path,
) -> Result<IngestReport, PipelineError> {
    let postings = load_job_postings(path).await?;
    let offset = index.get_or_create(collection).await?.count;

    let documents = postings
        .iter()
        .map(|posting| NewDocument {
            text: posting.composed_text(),
            metadata: posting.metadata(offset),
        })
        .collect();
    let ids = index.add(collection, documents).await?;

    info!(
        "Ingested {} job posting(s) from {} into '{collection}'",
        ids.len(),
        path.display()
    );
    Ok(IngestReport {
        collection: collection.to_string(),
        inserted: ids.len(),
        ids,
    })
}
