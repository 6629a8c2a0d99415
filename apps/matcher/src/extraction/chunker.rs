//! Chunker: splits a token sequence into bounded windows for model calls.
//!
//! Two policies:
//! - `Disjoint`: `ceil(len / max_size)` back-to-back chunks.
//! - `Overlapping`: sliding windows; each window after the first starts at
//!   `previous_end - overlap` so context carries across the boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkConfigError {
    #[error("max chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) must be smaller than max chunk size ({max_size})")]
    OverlapTooLarge { overlap: usize, max_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    Disjoint { max_size: usize },
    Overlapping { max_size: usize, overlap: usize },
}

impl ChunkPolicy {
    pub fn disjoint(max_size: usize) -> Result<Self, ChunkConfigError> {
        if max_size == 0 {
            return Err(ChunkConfigError::ZeroChunkSize);
        }
        Ok(Self::Disjoint { max_size })
    }

    /// Fails fast when `overlap >= max_size`: such a window could never advance.
    pub fn overlapping(max_size: usize, overlap: usize) -> Result<Self, ChunkConfigError> {
        if max_size == 0 {
            return Err(ChunkConfigError::ZeroChunkSize);
        }
        if overlap >= max_size {
            return Err(ChunkConfigError::OverlapTooLarge { overlap, max_size });
        }
        Ok(Self::Overlapping { max_size, overlap })
    }

    /// Builds the policy from optional configuration: no overlap means disjoint.
    pub fn from_settings(max_size: usize, overlap: Option<usize>) -> Result<Self, ChunkConfigError> {
        match overlap {
            Some(overlap) => Self::overlapping(max_size, overlap),
            None => Self::disjoint(max_size),
        }
    }

    pub fn max_size(&self) -> usize {
        match *self {
            Self::Disjoint { max_size } | Self::Overlapping { max_size, .. } => max_size,
        }
    }

    pub fn overlap(&self) -> usize {
        match *self {
            Self::Disjoint { .. } => 0,
            Self::Overlapping { overlap, .. } => overlap,
        }
    }

    /// Number of chunks `chunk` produces for an input of `len` tokens.
    pub fn chunk_count(&self, len: usize) -> usize {
        let max_size = self.max_size();
        if len == 0 {
            return 0;
        }
        if len <= max_size {
            return 1;
        }
        let step = max_size - self.overlap();
        1 + (len - max_size).div_ceil(step)
    }

    /// Splits `tokens` into ordered windows covering the whole input.
    pub fn chunk<'a, T>(&self, tokens: &'a [T]) -> Vec<&'a [T]> {
        match *self {
            Self::Disjoint { max_size } => tokens.chunks(max_size).collect(),
            Self::Overlapping { max_size, overlap } => {
                let mut windows = Vec::with_capacity(self.chunk_count(tokens.len()));
                if tokens.is_empty() {
                    return windows;
                }
                let mut start = 0;
                loop {
                    let end = (start + max_size).min(tokens.len());
                    windows.push(&tokens[start..end]);
                    if end == tokens.len() {
                        break;
                    }
                    start = end - overlap;
                }
                windows
            }
        }
    }
}
