use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::evaluation::{evaluate_scores, BinaryMetrics, DEFAULT_THRESHOLD};

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub actual_scores: Vec<f32>,
    pub predicted_scores: Vec<f32>,
    pub threshold: Option<f32>,
}

/// POST /api/v1/evaluate
pub async fn handle_evaluate(Json(req): Json<EvaluateRequest>) -> Result<Json<BinaryMetrics>, AppError> {
    let metrics = evaluate_scores(
        &req.actual_scores,
        &req.predicted_scores,
        req.threshold.unwrap_or(DEFAULT_THRESHOLD),
    )?;
    Ok(Json(metrics))
}
