//! Extraction Service: turns resume text into a best-effort candidate document.
//!
//! Flow: chunk(text) → summarize each chunk → join summaries →
//!       chunk(summary) → extract each chunk to JSON → join → first fenced block.
//!
//! Repair mode skips summarization and feeds the description of one invalid
//! section (plus the run's summary, when known) through the extraction pass.
//! The output is NOT guaranteed to be schema-valid; the validation repair loop
//! owns that guarantee.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::InputError;
use crate::extraction::chunker::ChunkPolicy;
use crate::extraction::prompts::{
    BUILTIN_EXAMPLE, EXTRACTOR_INSTRUCTION_TEMPLATE, EXTRACTOR_SYSTEM, REPAIR_DESCRIPTION_TEMPLATE,
    REPAIR_SUMMARY_HEADER, SUMMARIZER_INSTRUCTION, SUMMARIZER_SYSTEM,
};
use crate::extraction::structured::{extract_json_block, StructuredOutput};
use crate::extraction::tokenizer::Tokenizer;
use crate::llm_client::prompts::{FENCED_JSON_INSTRUCTION, OMIT_MISSING_INSTRUCTION};
use crate::llm_client::{LlmError, TextGenerator};
use crate::validation::repair::SectionRepairer;

/// Output of a fresh extraction.
#[derive(Debug)]
pub struct Extraction {
    /// Joined per-chunk summaries. Repair calls for this run receive it as context.
    pub summary: String,
    pub document: StructuredOutput,
}

pub struct ExtractionService {
    generator: Arc<dyn TextGenerator>,
    tokenizer: Arc<dyn Tokenizer>,
    policy: ChunkPolicy,
    extraction_instruction: String,
}

impl ExtractionService {
    /// `example` is the worked example embedded in the extraction instruction.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        tokenizer: Arc<dyn Tokenizer>,
        policy: ChunkPolicy,
        example: &str,
    ) -> Self {
        let extraction_instruction = EXTRACTOR_INSTRUCTION_TEMPLATE
            .replace("{omit_instruction}", OMIT_MISSING_INSTRUCTION)
            .replace("{fence_instruction}", FENCED_JSON_INSTRUCTION)
            .replace("{example}", example);
        Self {
            generator,
            tokenizer,
            policy,
            extraction_instruction,
        }
    }

    /// Runs both passes over `resume_text`.
    pub async fn extract(&self, resume_text: &str) -> Result<Extraction, LlmError> {
        let summary = self
            .run_pass(resume_text, SUMMARIZER_SYSTEM, SUMMARIZER_INSTRUCTION)
            .await?;
        info!("Summarization pass produced {} chars", summary.len());

        let raw_output = self
            .run_pass(&summary, EXTRACTOR_SYSTEM, &self.extraction_instruction)
            .await?;
        let document = extract_json_block(&raw_output);
        if let Err(e) = &document {
            warn!("Extraction pass returned no usable JSON: {e}");
            debug!("Raw extraction output: {raw_output}");
        }

        Ok(Extraction { summary, document })
    }

    /// Regenerates a single top-level section. Summarization is skipped.
    pub async fn extract_section(
        &self,
        section: &str,
        content: &Value,
        summary: Option<&str>,
    ) -> Result<StructuredOutput, LlmError> {
        let input = describe_invalid_section(section, content, summary);
        let raw_output = self
            .run_pass(&input, EXTRACTOR_SYSTEM, &self.extraction_instruction)
            .await?;
        Ok(extract_json_block(&raw_output))
    }

    /// Sends every chunk of `text` to the model and concatenates the trimmed
    /// responses in chunk order, one per line.
    async fn run_pass(&self, text: &str, system: &str, instruction: &str) -> Result<String, LlmError> {
        let tokens = self.tokenizer.encode(text);
        let chunks = self.policy.chunk(&tokens);
        debug!(
            "Pass over {} tokens in {} chunk(s) (max {}, overlap {})",
            tokens.len(),
            chunks.len(),
            self.policy.max_size(),
            self.policy.overlap()
        );

        let mut combined = String::new();
        for chunk in chunks {
            let chunk_text = self.tokenizer.decode(chunk);
            let prompt = format!("{instruction}\n\nResume Chunk:\n{chunk_text}");
            let response = self.generator.generate(system, &prompt).await?;
            combined.push_str(response.trim());
            combined.push('\n');
        }
        Ok(combined)
    }
}

#[async_trait]
impl SectionRepairer for ExtractionService {
    async fn repair_section(
        &self,
        section: &str,
        content: &Value,
        summary: Option<&str>,
    ) -> Result<StructuredOutput, LlmError> {
        self.extract_section(section, content, summary).await
    }
}

/// Repair-mode input text for one invalid section.
pub fn describe_invalid_section(section: &str, content: &Value, summary: Option<&str>) -> String {
    let mut description = REPAIR_DESCRIPTION_TEMPLATE
        .replace("{section}", section)
        .replace("{content}", &content.to_string());
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        description.push_str("\n\n");
        description.push_str(REPAIR_SUMMARY_HEADER);
        description.push('\n');
        description.push_str(summary.trim());
    }
    description
}

/// Loads the worked example from a reference corpus file, or falls back to the
/// built-in example. The file must hold a single JSON document.
pub async fn load_reference_example(path: Option<&Path>) -> Result<String, InputError> {
    let Some(path) = path else {
        return Ok(BUILTIN_EXAMPLE.to_string());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| InputError::Format {
        path: path.to_path_buf(),
        message: format!("reference example is not valid JSON: {e}"),
    })?;
    info!("Loaded reference example from {}", path.display());
    serde_json::to_string_pretty(&value).map_err(|e| InputError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
