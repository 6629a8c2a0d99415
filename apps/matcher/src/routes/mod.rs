pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::evaluation::handlers::handle_evaluate;
use crate::retrieval::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", post(handlers::handle_ingest_jobs))
        .route("/api/v1/resumes", post(handlers::handle_index_resumes))
        .route("/api/v1/retrieve", get(handlers::handle_retrieve))
        .route(
            "/api/v1/retrieve/batch",
            post(handlers::handle_retrieve_batch),
        )
        .route("/api/v1/evaluate", post(handle_evaluate))
        .route(
            "/api/v1/collections/:name",
            delete(handlers::handle_delete_collection),
        )
        .with_state(state)
}
