//! Bounded self-correction: validate → repair invalid sections → merge → validate.
//!
//! The retry counter increments after each repair round. Once it reaches
//! `max_retries` and the document is still invalid, the loop stops with a
//! rejection carrying the last diagnostics. There is no cycle detection; the
//! cap is the only stop condition besides success.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::extraction::structured::StructuredOutput;
use crate::llm_client::LlmError;
use crate::validation::schema::CandidateRecord;
use crate::validation::validator::{validate, ValidationFailure, ValidationVerdict};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// User-facing message for a resume that could not be repaired.
pub const REJECTION_MESSAGE: &str = "The resume is not complete and rejected.";

/// Regenerates one top-level section of a candidate document.
#[async_trait]
pub trait SectionRepairer: Send + Sync {
    /// `summary` is the source summary of the run being repaired, when known.
    async fn repair_section(
        &self,
        section: &str,
        content: &Value,
        summary: Option<&str>,
    ) -> Result<StructuredOutput, LlmError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub message: String,
    pub rounds: u32,
    pub last_failure: ValidationFailure,
}

#[derive(Debug)]
pub enum RepairOutcome {
    Valid { record: CandidateRecord, rounds: u32 },
    Rejected(Rejection),
}

pub struct RepairLoop {
    repairer: Arc<dyn SectionRepairer>,
    max_retries: u32,
}

impl RepairLoop {
    pub fn new(repairer: Arc<dyn SectionRepairer>, max_retries: u32) -> Self {
        Self {
            repairer,
            max_retries,
        }
    }

    /// Drives `document` to a valid record or a rejection. Model failures
    /// during repair are propagated, not counted as rounds.
    pub async fn run(
        &self,
        mut document: Value,
        summary: Option<&str>,
    ) -> Result<RepairOutcome, LlmError> {
        let mut rounds = 0;
        loop {
            let failure = match validate(&document) {
                ValidationVerdict::Valid(record) => {
                    info!("Candidate document valid after {rounds} repair round(s)");
                    return Ok(RepairOutcome::Valid { record, rounds });
                }
                ValidationVerdict::Invalid(failure) => failure,
            };

            if failure.invalid_sections.is_empty() {
                warn!(
                    "No repairable sections (failing: {}): {failure}",
                    failure.failing_sections().join(", ")
                );
                return Ok(reject(rounds, failure));
            }
            if rounds >= self.max_retries {
                warn!("Retry budget of {} exhausted: {failure}", self.max_retries);
                return Ok(reject(rounds, failure));
            }

            debug!("Repair round {}: {failure}", rounds + 1);
            let mut regenerated = Map::new();
            for (section, content) in &failure.invalid_sections {
                let output = self
                    .repairer
                    .repair_section(section, content, summary)
                    .await?;
                regenerated.insert(section.clone(), regenerated_section(section, output));
            }
            merge_sections(&mut document, regenerated);
            rounds += 1;
        }
    }
}

fn reject(rounds: u32, last_failure: ValidationFailure) -> RepairOutcome {
    RepairOutcome::Rejected(Rejection {
        message: REJECTION_MESSAGE.to_string(),
        rounds,
        last_failure,
    })
}

/// Unwraps `{section: inner}` to `inner`; unparseable output becomes `{}`.
fn regenerated_section(section: &str, output: StructuredOutput) -> Value {
    match output {
        Ok(Value::Object(mut fields)) => match fields.remove(section) {
            Some(inner) => inner,
            None => Value::Object(fields),
        },
        Ok(other) => other,
        Err(e) => {
            warn!("Regenerated '{section}' was unusable ({e}); using an empty object");
            Value::Object(Map::new())
        }
    }
}

/// Shallow overlay of `updates` onto `document`. Keys not in `updates` are
/// left untouched.
pub fn merge_sections(document: &mut Value, updates: Map<String, Value>) {
    match document.as_object_mut() {
        Some(fields) => {
            for (key, value) in updates {
                fields.insert(key, value);
            }
        }
        None => *document = Value::Object(updates),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::extraction::structured::StructuredOutputError;

    type Script = Box<dyn Fn(&str, &Value) -> Result<StructuredOutput, LlmError> + Send + Sync>;

    struct ScriptedRepairer {
        script: Script,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedRepairer {
        fn new(
            script: impl Fn(&str, &Value) -> Result<StructuredOutput, LlmError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Box::new(script),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn sections(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(s, _)| s.clone())
                .collect()
        }
    }

    #[async_trait]
    impl SectionRepairer for ScriptedRepairer {
        async fn repair_section(
            &self,
            section: &str,
            content: &Value,
            summary: Option<&str>,
        ) -> Result<StructuredOutput, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((section.to_string(), summary.map(str::to_string)));
            (self.script)(section, content)
        }
    }

    fn document() -> Value {
        json!({
            "basics": {"name": "Jane Doe", "email": "jane@example.com", "summary": "Engineer"},
            "work": [{"name": "Acme", "startDate": "2020-01-01", "endDate": "2019-01-01"}],
            "education": [{"institution": "MIT", "startDate": "2014-09-01", "endDate": "2018-06-01"}],
            "skills": ["Rust"],
            "projects": []
        })
    }

    fn fixed_work() -> Value {
        json!([{"name": "Acme", "startDate": "2019-01-01", "endDate": "2020-01-01"}])
    }

    #[tokio::test]
    async fn test_valid_document_needs_no_repair() {
        let repairer = ScriptedRepairer::new(|_, _| Ok(Ok(json!({}))));
        let mut doc = document();
        doc["work"] = fixed_work();

        let outcome = RepairLoop::new(repairer.clone(), 3).run(doc, None).await.unwrap();

        assert!(matches!(outcome, RepairOutcome::Valid { rounds: 0, .. }));
        assert!(repairer.sections().is_empty());
    }

    #[tokio::test]
    async fn test_one_round_repairs_only_invalid_section() {
        let repairer = ScriptedRepairer::new(|section, _| Ok(Ok(json!({ section: fixed_work() }))));

        let outcome = RepairLoop::new(repairer.clone(), 3)
            .run(document(), Some("Worked at Acme"))
            .await
            .unwrap();

        let RepairOutcome::Valid { record, rounds } = outcome else {
            panic!("expected valid");
        };
        assert_eq!(rounds, 1);
        assert_eq!(record.work.unwrap()[0].start_date, "2019-01-01");
        let calls = repairer.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("work".to_string(), Some("Worked at Acme".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_bare_section_output_is_accepted() {
        let repairer = ScriptedRepairer::new(|_, _| Ok(Ok(fixed_work())));

        let outcome = RepairLoop::new(repairer, 3).run(document(), None).await.unwrap();

        assert!(matches!(outcome, RepairOutcome::Valid { rounds: 1, .. }));
    }

    #[tokio::test]
    async fn test_rejects_after_exactly_max_rounds() {
        // echoes the invalid content back, so every round stays invalid
        let repairer = ScriptedRepairer::new(|_, content| Ok(Ok(content.clone())));

        let outcome = RepairLoop::new(repairer.clone(), 3)
            .run(document(), None)
            .await
            .unwrap();

        let RepairOutcome::Rejected(rejection) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.rounds, 3);
        assert_eq!(rejection.message, REJECTION_MESSAGE);
        assert_eq!(repairer.sections(), vec!["work", "work", "work"]);
        assert!(rejection.last_failure.invalid_sections.contains_key("work"));
    }

    #[tokio::test]
    async fn test_zero_budget_rejects_without_repair() {
        let repairer = ScriptedRepairer::new(|_, _| Ok(Ok(fixed_work())));

        let outcome = RepairLoop::new(repairer.clone(), 0)
            .run(document(), None)
            .await
            .unwrap();

        assert!(matches!(outcome, RepairOutcome::Rejected(Rejection { rounds: 0, .. })));
        assert!(repairer.sections().is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_section_rejects_immediately() {
        let repairer = ScriptedRepairer::new(|_, _| Ok(Ok(json!([]))));
        let mut doc = document();
        doc["work"] = fixed_work();
        doc.as_object_mut().unwrap().remove("skills");

        let outcome = RepairLoop::new(repairer.clone(), 3).run(doc, None).await.unwrap();

        let RepairOutcome::Rejected(rejection) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.rounds, 0);
        assert_eq!(rejection.last_failure.failing_sections(), vec!["skills"]);
        assert!(repairer.sections().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades_to_empty_object() {
        let repairer =
            ScriptedRepairer::new(|_, _| Ok(Err(StructuredOutputError::NoJsonBlock)));

        let outcome = RepairLoop::new(repairer, 1).run(document(), None).await.unwrap();

        let RepairOutcome::Rejected(rejection) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.last_failure.invalid_sections["work"], json!({}));
        assert_eq!(
            rejection.last_failure.violations[0].message,
            "expected a list, found an object"
        );
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let repairer = ScriptedRepairer::new(|_, _| Err(LlmError::EmptyContent));

        let result = RepairLoop::new(repairer, 3).run(document(), None).await;

        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_merge_leaves_other_keys_byte_identical() {
        let original = document();
        let mut merged = original.clone();
        let mut updates = Map::new();
        updates.insert("skills".to_string(), json!(["Rust", "Go"]));

        merge_sections(&mut merged, updates);

        assert_eq!(merged["skills"], json!(["Rust", "Go"]));
        for key in ["basics", "work", "education", "projects"] {
            assert_eq!(
                serde_json::to_string(&merged[key]).unwrap(),
                serde_json::to_string(&original[key]).unwrap()
            );
        }
    }

    #[test]
    fn test_merge_into_non_object_replaces_document() {
        let mut doc = json!("garbage");
        let mut updates = Map::new();
        updates.insert("skills".to_string(), json!([]));

        merge_sections(&mut doc, updates);

        assert_eq!(doc, json!({"skills": []}));
    }
}
