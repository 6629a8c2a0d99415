use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::evaluation::EvaluationError;
use crate::index::IndexError;
use crate::llm_client::LlmError;

/// Unreadable or malformed input documents.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("Unsupported document type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No resumes found in {}", .0.display())]
    NoResumes(PathBuf),
}

/// Everything the retrieval pipeline can fail with. A rejected resume is not
/// an error; see `RetrievalOutcome`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to encode candidate record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<IndexError> for AppError {
    fn from(e: IndexError) -> Self {
        AppError::Pipeline(e.into())
    }
}

impl From<EvaluationError> for AppError {
    fn from(e: EvaluationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<InputError> for AppError {
    fn from(e: InputError) -> Self {
        AppError::Pipeline(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(PipelineError::Database(e)) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Pipeline(PipelineError::Input(e)) => {
                (StatusCode::BAD_REQUEST, "INPUT_ERROR", e.to_string())
            }
            AppError::Pipeline(PipelineError::Index(e)) => match e {
                IndexError::CollectionNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
                }
                IndexError::InvalidCollectionName(_) | IndexError::CollectionExists(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                _ => {
                    tracing::error!("Index error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INDEX_ERROR",
                        "A vector index error occurred".to_string(),
                    )
                }
            },
            AppError::Pipeline(PipelineError::Llm(e)) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Pipeline(PipelineError::Encoding(e)) => {
                tracing::error!("Encoding error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
