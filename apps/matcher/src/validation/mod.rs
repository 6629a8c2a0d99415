// Validation: the typed CandidateRecord schema, violation reporting, and the
// bounded section-repair loop.

pub mod repair;
pub mod schema;
pub mod validator;

pub use repair::{RepairLoop, RepairOutcome, DEFAULT_MAX_RETRIES};
pub use schema::CandidateRecord;
pub use validator::Violation;
