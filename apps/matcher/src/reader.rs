//! Document Reader: resume files to plain text.
//!
//! PDF text extraction is CPU-bound and can panic on malformed files, so it
//! runs on the blocking pool; a panicked task is reported as a format error.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::InputError;

#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String, InputError>;
}

/// Reads `.pdf` via `pdf-extract` and `.txt`, `.md`, `.csv` as UTF-8.
pub struct FileDocumentReader;

#[async_trait]
impl DocumentReader for FileDocumentReader {
    async fn read(&self, path: &Path) -> Result<String, InputError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let text = match extension.as_deref() {
            Some("pdf") => read_pdf(path).await?,
            Some("txt" | "md" | "csv") => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| InputError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?
            }
            _ => return Err(InputError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!("Read {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}

async fn read_pdf(path: &Path) -> Result<String, InputError> {
    // surface a missing file as I/O, not as a PDF parse failure
    tokio::fs::metadata(path)
        .await
        .map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let owned = path.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| InputError::Format {
            path: path.to_path_buf(),
            message: format!("PDF extraction aborted: {e}"),
        })?;

    extracted.map_err(|e| InputError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
