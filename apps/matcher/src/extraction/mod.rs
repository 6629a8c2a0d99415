// Extraction: tokenization, chunking, the two-pass model protocol, and
// structured-output parsing.
// All model calls go through llm_client::TextGenerator.

pub mod chunker;
pub mod prompts;
pub mod service;
pub mod structured;
pub mod tokenizer;

pub use chunker::ChunkPolicy;
pub use service::{load_reference_example, ExtractionService};
pub use tokenizer::WhitespaceTokenizer;
