// Enrichment attached to a validated CandidateRecord. Never requested from the model.

pub mod gender;

pub use gender::{Gender, GenderClassifier, PronounGenderClassifier};
