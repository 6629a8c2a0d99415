// Retrieval: the per-resume orchestrator, job posting and resume ingestion,
// the batch driver, and their HTTP handlers.
// Model calls go through extraction; storage goes through index and db.

pub mod batch;
pub mod handlers;
pub mod jobs;
pub mod orchestrator;
pub mod resumes;

pub use orchestrator::Retriever;
