/// Converts text into a token sequence for chunking and back.
///
/// Implementations must be lossless: `decode(&encode(text)) == text`, so a
/// decoded chunk is exactly the slice of source text it covers.
pub trait Tokenizer: Send + Sync {
    fn encode<'a>(&self, text: &'a str) -> Vec<&'a str>;

    fn decode(&self, tokens: &[&str]) -> String {
        tokens.concat()
    }
}

/// Word tokenizer: every token is a word plus the whitespace that follows it.
/// Leading whitespace is folded into the first token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn encode<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        let mut start = 0;
        let mut seen_word = false;
        let mut prev_whitespace = false;

        for (i, ch) in text.char_indices() {
            let whitespace = ch.is_whitespace();
            if !whitespace && prev_whitespace && seen_word {
                tokens.push(&text[start..i]);
                start = i;
            }
            seen_word |= !whitespace;
            prev_whitespace = whitespace;
        }

        if start < text.len() {
            tokens.push(&text[start..]);
        }
        tokens
    }
}
