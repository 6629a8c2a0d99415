// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Output contract for every structured call: one fenced JSON block, nothing else.
pub const FENCED_JSON_INSTRUCTION: &str = "\
    Respond with exactly one JSON object wrapped in a ```json fenced code block. \
    Do NOT include explanations, apologies, or any text outside the code block.";

/// Rule against placeholder values in extracted data.
pub const OMIT_MISSING_INSTRUCTION: &str = "\
    CRITICAL: If information for a field or section is not present in the text, \
    omit it entirely. Never invent values and never emit placeholders such as \
    \"N/A\", \"Unknown\", empty strings, empty objects, or empty arrays.";
