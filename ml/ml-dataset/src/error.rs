//! Error types for ml-dataset crate.

use thiserror::Error;

/// Errors that can occur in ml-dataset operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    /// Empty dataset.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Batch with no samples.
    #[error("batch is empty")]
    EmptyBatch,

    /// Invalid batch size.
    #[error("invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    /// Invalid split ratio.
    #[error("invalid split ratio: {0} (must be in (0, 1))")]
    InvalidSplitRatio(f32),

    /// Batch step out of range.
    #[error("batch {step} out of range (epoch has {num_batches} batches)")]
    StepOutOfRange {
        /// Requested step.
        step: usize,
        /// Batches per epoch.
        num_batches: usize,
    },

    /// Shapes within a batch disagree.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DatasetError {
    /// Creates an invalid batch size error.
    #[must_use]
    pub const fn invalid_batch_size(size: usize) -> Self {
        Self::InvalidBatchSize(size)
    }

    /// Creates an invalid split ratio error.
    #[must_use]
    pub const fn invalid_split_ratio(ratio: f32) -> Self {
        Self::InvalidSplitRatio(ratio)
    }

    /// Creates a step out of range error.
    #[must_use]
    pub const fn step_out_of_range(step: usize, num_batches: usize) -> Self {
        Self::StepOutOfRange { step, num_batches }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

/// Result type for ml-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
