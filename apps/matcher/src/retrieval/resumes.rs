//! Resume indexing: every PDF resume in a directory becomes one document in
//! the resume collection, keyed back to its file by `source` metadata.

use std::path::Path;

use serde_json::{json, Map};
use tracing::info;

use crate::errors::PipelineError;
use crate::index::{NewDocument, VectorIndex};
use crate::reader::DocumentReader;
use crate::retrieval::batch::collect_resumes;
use crate::retrieval::jobs::IngestReport;

/// Reads every resume before inserting any; one unreadable file fails the
/// whole call and leaves the collection untouched.
pub async fn index_resumes(
    index: &VectorIndex,
    reader: &dyn DocumentReader,
    collection: &str,
    dir: &Path,
) -> Result<IngestReport, PipelineError> {
    let paths = collect_resumes(dir).await?;
    index.get_or_create(collection).await?;

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = reader.read(path).await?;
        let mut metadata = Map::new();
        metadata.insert("source".to_string(), json!(path.display().to_string()));
        documents.push(NewDocument { text, metadata });
    }
    let ids = index.add(collection, documents).await?;

    info!(
        "Indexed {} resume(s) from {} into '{collection}'",
        ids.len(),
        dir.display()
    );
    Ok(IngestReport {
        collection: collection.to_string(),
        inserted: ids.len(),
        ids,
    })
}
