//! Batch driver: path-based retrieval for every PDF resume in a directory.
//!
//! Each resume runs as its own spawned task, at most `workers` at a time.
//! A failing (or panicking) resume is logged and recorded as `None`; it never
//! aborts the batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::errors::InputError;
use crate::retrieval::orchestrator::{RetrievalOutcome, Retriever};

pub type BatchResults = BTreeMap<PathBuf, Option<RetrievalOutcome>>;

/// `*.pdf` files directly inside `dir`, sorted. Errors when there are none.
pub async fn collect_resumes(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let io_error = |source| InputError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut resumes = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            resumes.push(path);
        }
    }

    if resumes.is_empty() {
        error!("No resume files found in {}", dir.display());
        return Err(InputError::NoResumes(dir.to_path_buf()));
    }
    resumes.sort();
    Ok(resumes)
}

pub async fn run_batch(
    retriever: Arc<Retriever>,
    dir: &Path,
    top_k: usize,
    workers: usize,
) -> Result<BatchResults, InputError> {
    let resumes = collect_resumes(dir).await?;
    info!(
        "Processing {} resume(s) from {} with {} worker(s)",
        resumes.len(),
        dir.display(),
        workers.max(1)
    );

    let results: BatchResults = stream::iter(resumes)
        .map(|path| {
            let retriever = retriever.clone();
            async move {
                let task_path = path.clone();
                let handle =
                    tokio::spawn(async move { retriever.retrieve_path(&task_path, top_k).await });
                let outcome = match handle.await {
                    Ok(Ok(outcome)) => Some(outcome),
                    Ok(Err(e)) => {
                        error!("Error processing {}: {e}", path.display());
                        None
                    }
                    Err(e) => {
                        error!("Task for {} did not complete: {e}", path.display());
                        None
                    }
                };
                (path, outcome)
            }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let failed = results.values().filter(|r| r.is_none()).count();
    info!(
        "Batch finished: {} succeeded, {failed} failed",
        results.len() - failed
    );
    Ok(results)
}
