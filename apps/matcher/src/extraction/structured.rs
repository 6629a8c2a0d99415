//! Structured-output extraction: locates the JSON document inside free-form
//! model output and parses it.
//!
//! Absence of a usable block is a typed outcome, not a panic or a silent `None`:
//! the repair loop consumes `StructuredOutputError` uniformly as "no data".

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructuredOutputError {
    #[error("model output contains no JSON block")]
    NoJsonBlock,

    #[error("JSON block could not be parsed: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Result of structured extraction over one model response.
pub type StructuredOutput = Result<Value, StructuredOutputError>;

/// Finds the first JSON block in `text` and parses it.
///
/// Search order: a ```` ```json ```` fence, then any other fence, then the
/// whole trimmed text when it starts with `{` (models occasionally drop the fence).
pub fn extract_json_block(text: &str) -> StructuredOutput {
    let block = find_json_block(text).ok_or(StructuredOutputError::NoJsonBlock)?;
    Ok(serde_json::from_str(block)?)
}

fn find_json_block(text: &str) -> Option<&str> {
    if let Some(body) = fenced_body(text, "```json") {
        return Some(body);
    }
    if let Some(body) = fenced_body(text, "```") {
        return Some(body);
    }
    let trimmed = text.trim();
    trimmed.starts_with('{').then_some(trimmed)
}

/// Body between `opener` and the next closing fence. A language tag left on
/// the opener line (e.g. ```` ```JSON ````) is skipped.
fn fenced_body<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let mut rest = &text[start..];
    if let Some(newline) = rest.find('\n') {
        let tag = rest[..newline].trim();
        if tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            rest = &rest[newline + 1..];
        }
    }
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_json_fence() {
        let output = "Here is the data:\n```json\n{\"skills\": [\"Rust\"]}\n```\nDone.";
        let value = extract_json_block(output).unwrap();
        assert_eq!(value["skills"][0], "Rust");
    }

    #[test]
    fn test_extracts_bare_fence() {
        let output = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_block(output).unwrap()["key"], "value");
    }

    #[test]
    fn test_extracts_fence_with_uppercase_tag() {
        let output = "```JSON\n{\"key\": 1}\n```";
        assert_eq!(extract_json_block(output).unwrap()["key"], 1);
    }

    #[test]
    fn test_first_block_wins_across_chunks() {
        let output = "```json\n{\"a\": 1}\n```\n```json\n{\"b\": 2}\n```\n";
        let value = extract_json_block(output).unwrap();
        assert_eq!(value["a"], 1);
        assert!(value.get("b").is_none());
    }

    #[test]
    fn test_unfenced_object_is_accepted() {
        let output = "  {\"key\": \"value\"}\n";
        assert_eq!(extract_json_block(output).unwrap()["key"], "value");
    }

    #[test]
    fn test_prose_only_is_no_block() {
        let result = extract_json_block("I could not find any resume data.");
        assert!(matches!(result, Err(StructuredOutputError::NoJsonBlock)));
    }

    #[test]
    fn test_unterminated_fence_is_no_block() {
        let result = extract_json_block("```json\n{\"key\": \"value\"}");
        assert!(matches!(result, Err(StructuredOutputError::NoJsonBlock)));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let result = extract_json_block("```json\n{\"key\": }\n```");
        assert!(matches!(result, Err(StructuredOutputError::InvalidJson(_))));
    }
}
