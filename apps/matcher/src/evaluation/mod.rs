//! Match quality evaluation: reference and predicted similarity scores are
//! binarized at a threshold, then compared as labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod handlers;

pub const DEFAULT_THRESHOLD: f32 = 0.8;

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("Score lists differ in length: {actual} actual, {predicted} predicted")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("At least one score pair is required")]
    Empty,

    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f32),
}

/// Confusion counts for one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl Confusion {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub precision: f32,
    pub recall: f32,
    pub accuracy: f32,
    pub confusion: Confusion,
}

/// A score at or above `threshold` is a positive.
pub fn binarize(scores: &[f32], threshold: f32) -> Vec<bool> {
    scores.iter().map(|score| *score >= threshold).collect()
}

/// Ratios with a zero denominator are reported as 0.
pub fn binary_metrics(actual: &[bool], predicted: &[bool]) -> Result<BinaryMetrics, EvaluationError> {
    if actual.len() != predicted.len() {
        return Err(EvaluationError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(EvaluationError::Empty);
    }

    let mut confusion = Confusion::default();
    for (truth, guess) in actual.iter().zip(predicted) {
        match (truth, guess) {
            (true, true) => confusion.true_positives += 1,
            (false, true) => confusion.false_positives += 1,
            (true, false) => confusion.false_negatives += 1,
            (false, false) => confusion.true_negatives += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f32 / den as f32 };
    Ok(BinaryMetrics {
        precision: ratio(
            confusion.true_positives,
            confusion.true_positives + confusion.false_positives,
        ),
        recall: ratio(
            confusion.true_positives,
            confusion.true_positives + confusion.false_negatives,
        ),
        accuracy: ratio(
            confusion.true_positives + confusion.true_negatives,
            confusion.total(),
        ),
        confusion,
    })
}

/// Binarizes both score lists at `threshold` and compares them.
pub fn evaluate_scores(
    actual: &[f32],
    predicted: &[f32],
    threshold: f32,
) -> Result<BinaryMetrics, EvaluationError> {
    if !threshold.is_finite() {
        return Err(EvaluationError::InvalidThreshold(threshold));
    }
    binary_metrics(&binarize(actual, threshold), &binarize(predicted, threshold))
}
