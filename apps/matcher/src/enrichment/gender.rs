//! Gender Classifier: pronoun-count heuristic over the raw resume text.
//!
//! The retriever holds an `Arc<dyn GenderClassifier>` and attaches the result
//! to `basics.gender` after validation.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

pub trait GenderClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Gender;
}

// ────────────────────────────────────────────────────────────────────────────
// PronounGenderClassifier
// ────────────────────────────────────────────────────────────────────────────

/// Counts whole-word pronouns, case-insensitively. The larger count wins;
/// a tie (including zero/zero) is `Unknown`.
pub struct PronounGenderClassifier {
    male: Regex,
    female: Regex,
}

impl PronounGenderClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            male: Regex::new(r"(?i)\b(he|him|his)\b")?,
            female: Regex::new(r"(?i)\b(she|her|hers)\b")?,
        })
    }
}

impl GenderClassifier for PronounGenderClassifier {
    fn classify(&self, text: &str) -> Gender {
        let male = self.male.find_iter(text).count();
        let female = self.female.find_iter(text).count();
        match male.cmp(&female) {
            std::cmp::Ordering::Greater => Gender::Male,
            std::cmp::Ordering::Less => Gender::Female,
            std::cmp::Ordering::Equal => Gender::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Gender {
        PronounGenderClassifier::new().unwrap().classify(text)
    }

    #[test]
    fn test_majority_pronoun_wins() {
        assert_eq!(classify("He led the team. His work shipped."), Gender::Male);
        assert_eq!(classify("She founded it; the idea was hers. He helped her."), Gender::Female);
    }

    #[test]
    fn test_tie_and_absence_are_unknown() {
        assert_eq!(classify("He and she co-authored it."), Gender::Unknown);
        assert_eq!(classify("Built distributed systems in Rust."), Gender::Unknown);
    }

    #[test]
    fn test_whole_words_only() {
        // "the", "shell", "ethics", "hershey" contain pronoun substrings
        assert_eq!(classify("the shell ethics hershey"), Gender::Unknown);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("HE HIM His"), Gender::Male);
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"Female\"");
        assert_eq!(Gender::Unknown.to_string(), "Unknown");
    }
}
