//! Retrieval Orchestrator: resume text in, ranked job postings out.
//!
//! Flow: extract → validate/repair → (rejected: stop, no query) →
//!       serialize record as query → k-nearest postings → attach gender →
//!       persist matches (path-based calls, when a store is configured).
//!
//! Holds no state between calls; each call carries its own extraction summary.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::db::MatchStore;
use crate::enrichment::GenderClassifier;
use crate::errors::PipelineError;
use crate::extraction::ExtractionService;
use crate::index::{MatchResult, VectorIndex};
use crate::reader::DocumentReader;
use crate::validation::{CandidateRecord, RepairLoop, RepairOutcome, Violation};

pub const DEFAULT_TOP_K: usize = 2;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    Matched {
        candidate: CandidateRecord,
        matches: Vec<MatchResult>,
    },
    Rejected {
        message: String,
        violations: Vec<Violation>,
    },
}

impl RetrievalOutcome {
    pub fn matches(&self) -> Option<&[MatchResult]> {
        match self {
            RetrievalOutcome::Matched { matches, .. } => Some(matches),
            RetrievalOutcome::Rejected { .. } => None,
        }
    }
}

pub struct Retriever {
    reader: Arc<dyn DocumentReader>,
    extractor: Arc<ExtractionService>,
    repair: RepairLoop,
    index: Arc<VectorIndex>,
    gender: Arc<dyn GenderClassifier>,
    match_store: Option<Arc<dyn MatchStore>>,
    collection: String,
}

impl Retriever {
    pub fn new(
        reader: Arc<dyn DocumentReader>,
        extractor: Arc<ExtractionService>,
        max_retries: u32,
        index: Arc<VectorIndex>,
        gender: Arc<dyn GenderClassifier>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            repair: RepairLoop::new(extractor.clone(), max_retries),
            extractor,
            index,
            gender,
            match_store: None,
            collection: collection.into(),
        }
    }

    /// Persists the matches of every path-based retrieval.
    pub fn with_match_store(mut self, store: Arc<dyn MatchStore>) -> Self {
        self.match_store = Some(store);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn retrieve(
        &self,
        resume_text: &str,
        top_k: usize,
    ) -> Result<RetrievalOutcome, PipelineError> {
        let extraction = self.extractor.extract(resume_text).await?;
        let document = extraction.document.unwrap_or_else(|e| {
            warn!("Extraction produced no candidate document: {e}");
            Value::Object(Map::new())
        });

        let mut record = match self.repair.run(document, Some(&extraction.summary)).await? {
            RepairOutcome::Valid { record, rounds } => {
                info!("Candidate record accepted after {rounds} repair round(s)");
                record
            }
            RepairOutcome::Rejected(rejection) => {
                warn!(
                    "Resume rejected after {} round(s): {}",
                    rejection.rounds, rejection.last_failure
                );
                return Ok(RetrievalOutcome::Rejected {
                    message: rejection.message,
                    violations: rejection.last_failure.violations,
                });
            }
        };

        let query = serde_json::to_string(&record)?;
        let matches = self.index.query(&self.collection, &query, top_k).await?;
        record.basics.gender = Some(self.gender.classify(resume_text));

        info!(
            "Retrieved {} job posting(s) from '{}'",
            matches.len(),
            self.collection
        );
        Ok(RetrievalOutcome::Matched {
            candidate: record,
            matches,
        })
    }

    /// Reads the document at `path`, then retrieves as `retrieve` does.
    pub async fn retrieve_path(
        &self,
        path: &Path,
        top_k: usize,
    ) -> Result<RetrievalOutcome, PipelineError> {
        let text = self.reader.read(path).await?;
        let outcome = self.retrieve(&text, top_k).await?;

        if let (Some(store), Some(matches)) = (&self.match_store, outcome.matches()) {
            store
                .save_matches(&path.to_string_lossy(), matches)
                .await?;
        }
        info!("Retrieval finished for {}", path.display());
        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::enrichment::{Gender, PronounGenderClassifier};
    use crate::errors::InputError;
    use crate::extraction::prompts::{BUILTIN_EXAMPLE, SUMMARIZER_SYSTEM};
    use crate::extraction::{ChunkPolicy, WhitespaceTokenizer};
    use crate::index::{DistanceMetric, HashEmbedder, NewDocument};
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::reader::{DocumentReader, FileDocumentReader};
    use crate::validation::repair::REJECTION_MESSAGE;

    pub(crate) const RESUME: &str = "Jane Doe. She builds Rust services. Her email is jane@example.com.";

    pub(crate) fn candidate_json() -> Value {
        json!({
            "basics": {"name": "Jane Doe", "email": "jane@example.com", "summary": "Rust backend engineer"},
            "education": [{"institution": "TU Berlin", "startDate": "2012-10-01", "endDate": "2016-09-30"}],
            "skills": ["Rust", "Postgres", "distributed systems"],
            "projects": [{"name": "storage engine"}]
        })
    }

    /// Summaries echo the chunk; extraction always answers with `document`.
    pub(crate) fn generator(document: Value) -> Arc<ScriptedGenerator> {
        let fenced = format!("```json\n{document}\n```");
        Arc::new(ScriptedGenerator::new(move |system, prompt| {
            if system == SUMMARIZER_SYSTEM {
                prompt.rsplit("Resume Chunk:\n").next().unwrap_or_default().to_string()
            } else {
                fenced.clone()
            }
        }))
    }

    pub(crate) async fn seeded_index() -> Arc<VectorIndex> {
        let index = Arc::new(VectorIndex::in_memory(
            Arc::new(HashEmbedder::new(256).unwrap()),
            DistanceMetric::Cosine,
        ));
        index.create("job_postings").await.unwrap();
        let postings = [
            "Job: Storage\nPosition: Rust backend engineer\nLocation: Berlin\nJob Description: Rust Postgres distributed systems",
            "Job: Bakery\nPosition: Pastry chef\nLocation: Lyon\nJob Description: croissants and sourdough",
            "Job: School\nPosition: Teacher\nLocation: Oslo\nJob Description: early childhood education",
        ];
        let docs = postings
            .iter()
            .enumerate()
            .map(|(idx, text)| NewDocument {
                text: text.to_string(),
                metadata: json!({ "idx": idx }).as_object().cloned().unwrap(),
            })
            .collect();
        index.add("job_postings", docs).await.unwrap();
        index
    }

    /// Returns `RESUME` for every path except the file names in `broken`.
    pub(crate) struct FakeReader {
        pub broken: Vec<&'static str>,
    }

    #[async_trait]
    impl DocumentReader for FakeReader {
        async fn read(&self, path: &std::path::Path) -> Result<String, InputError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if self.broken.contains(&name) {
                return Err(InputError::Format {
                    path: path.to_path_buf(),
                    message: "unreadable".to_string(),
                });
            }
            Ok(RESUME.to_string())
        }
    }

    pub(crate) fn retriever(generator: Arc<ScriptedGenerator>, index: Arc<VectorIndex>) -> Retriever {
        retriever_with_reader(generator, index, Arc::new(FileDocumentReader))
    }

    pub(crate) fn retriever_with_reader(
        generator: Arc<ScriptedGenerator>,
        index: Arc<VectorIndex>,
        reader: Arc<dyn DocumentReader>,
    ) -> Retriever {
        let extractor = Arc::new(ExtractionService::new(
            generator,
            Arc::new(WhitespaceTokenizer),
            ChunkPolicy::disjoint(1024).unwrap(),
            BUILTIN_EXAMPLE,
        ));
        Retriever::new(
            reader,
            extractor,
            3,
            index,
            Arc::new(PronounGenderClassifier::new().unwrap()),
            "job_postings",
        )
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl MatchStore for RecordingStore {
        async fn save_matches(
            &self,
            resume_path: &str,
            matches: &[MatchResult],
        ) -> Result<Uuid, sqlx::Error> {
            let ids = matches.iter().map(|m| m.chunk_id.clone()).collect();
            self.saved.lock().unwrap().push((resume_path.to_string(), ids));
            Ok(Uuid::new_v4())
        }
    }

    #[tokio::test]
    async fn test_valid_resume_is_matched_and_enriched() {
        let retriever = retriever(generator(candidate_json()), seeded_index().await);

        let outcome = retriever.retrieve(RESUME, 2).await.unwrap();

        let RetrievalOutcome::Matched { candidate, matches } = outcome else {
            panic!("expected matches");
        };
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].chunk_id, "id_0");
        assert_eq!(candidate.basics.gender, Some(Gender::Female));
    }

    #[tokio::test]
    async fn test_incomplete_resume_is_rejected_without_query() {
        let mut document = candidate_json();
        document.as_object_mut().unwrap().remove("education");
        let generator = generator(document);
        let retriever = retriever(generator.clone(), seeded_index().await);

        let outcome = retriever.retrieve(RESUME, 2).await.unwrap();

        let RetrievalOutcome::Rejected { message, violations } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(message, REJECTION_MESSAGE);
        assert_eq!(violations[0].section, "education");
        // one summary call and one extraction call; no repair was possible
        assert_eq!(generator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_outcome_serializes_with_status_tag() {
        let retriever = retriever(generator(candidate_json()), seeded_index().await);

        let outcome = retriever.retrieve(RESUME, 1).await.unwrap();
        let body = serde_json::to_value(&outcome).unwrap();

        assert_eq!(body["status"], "matched");
        assert_eq!(body["candidate"]["basics"]["gender"], "Female");
        assert!(body["matches"][0]["page_content"].as_str().unwrap().contains("Berlin"));
    }

    #[tokio::test]
    async fn test_retrieve_path_reads_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jane.txt");
        std::fs::write(&path, RESUME).unwrap();
        let store = Arc::new(RecordingStore::default());
        let retriever = retriever(generator(candidate_json()), seeded_index().await)
            .with_match_store(store.clone());

        retriever.retrieve_path(&path, 2).await.unwrap();

        let saved = store.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, path.to_string_lossy());
        assert_eq!(saved[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_collection_is_an_error() {
        let index = Arc::new(VectorIndex::in_memory(
            Arc::new(HashEmbedder::default()),
            DistanceMetric::Cosine,
        ));
        let retriever = retriever(generator(candidate_json()), index);

        let result = retriever.retrieve(RESUME, 2).await;

        assert!(matches!(result, Err(PipelineError::Index(_))));
    }
}
