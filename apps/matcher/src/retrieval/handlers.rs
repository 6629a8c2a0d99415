use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::retrieval::batch::run_batch;
use crate::retrieval::jobs::{ingest_job_postings, IngestReport};
use crate::retrieval::orchestrator::{RetrievalOutcome, DEFAULT_TOP_K};
use crate::retrieval::resumes::index_resumes;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IngestJobsRequest {
    pub csv_path: PathBuf,
}

#[derive(Deserialize)]
pub struct IndexResumesRequest {
    pub resume_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct RetrieveQuery {
    pub resume_path: Option<PathBuf>,
    pub top_k: Option<usize>,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub resume_dir: PathBuf,
    pub top_k: Option<usize>,
}

fn top_k(requested: Option<usize>) -> Result<usize, AppError> {
    match requested.unwrap_or(DEFAULT_TOP_K) {
        0 => Err(AppError::Validation("top_k must be at least 1".to_string())),
        k => Ok(k),
    }
}

/// POST /api/v1/jobs
pub async fn handle_ingest_jobs(
    State(state): State<AppState>,
    Json(req): Json<IngestJobsRequest>,
) -> Result<(StatusCode, Json<IngestReport>), AppError> {
    let report =
        ingest_job_postings(&state.index, state.retriever.collection(), &req.csv_path).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// POST /api/v1/resumes
pub async fn handle_index_resumes(
    State(state): State<AppState>,
    Json(req): Json<IndexResumesRequest>,
) -> Result<(StatusCode, Json<IngestReport>), AppError> {
    let report = index_resumes(
        &state.index,
        state.reader.as_ref(),
        &state.config.resume_collection,
        &req.resume_dir,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/retrieve
pub async fn handle_retrieve(
    State(state): State<AppState>,
    Query(params): Query<RetrieveQuery>,
) -> Result<Json<RetrievalOutcome>, AppError> {
    let resume_path = params
        .resume_path
        .ok_or_else(|| AppError::Validation("resume_path is required".to_string()))?;
    let k = top_k(params.top_k)?;
    let outcome = state.retriever.retrieve_path(&resume_path, k).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/retrieve/batch
/// Keys are resume paths; a `null` value marks a resume that failed.
pub async fn handle_retrieve_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BTreeMap<String, Option<RetrievalOutcome>>>, AppError> {
    let k = top_k(req.top_k)?;
    let results = run_batch(
        state.retriever.clone(),
        &req.resume_dir,
        k,
        state.config.worker_count,
    )
    .await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(path, outcome)| (path.display().to_string(), outcome))
            .collect(),
    ))
}

/// DELETE /api/v1/collections/:name
pub async fn handle_delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.index.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
