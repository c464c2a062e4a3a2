//! Error types for ml-methods crate.

use ml_dataset::DatasetError;
use ml_models::ModelError;
use ml_training::TrainingError;
use ml_transforms::TransformError;
use thiserror::Error;

/// Errors that can occur when encoding, decoding, or building models.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MethodError {
    /// Target label is not one of the method's classes.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// Class list contains a label twice.
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// Class list is empty.
    #[error("class list is empty")]
    EmptyClasses,

    /// Buffer or score vector has the wrong shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Score vector cannot be decoded.
    #[error("invalid scores: {0}")]
    InvalidScores(String),

    /// Invalid method configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A method broke its encode/decode contract.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Transform error.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Model error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Dataset error.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Training error.
    #[error("training error: {0}")]
    Training(#[from] TrainingError),
}

impl MethodError {
    /// Creates an unknown class error.
    #[must_use]
    pub fn unknown_class(label: impl std::fmt::Debug) -> Self {
        Self::UnknownClass(format!("{label:?}"))
    }

    /// Creates a duplicate class error.
    #[must_use]
    pub fn duplicate_class(label: impl std::fmt::Debug) -> Self {
        Self::DuplicateClass(format!("{label:?}"))
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid scores error.
    #[must_use]
    pub fn invalid_scores(reason: impl Into<String>) -> Self {
        Self::InvalidScores(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a contract violation error.
    #[must_use]
    pub fn contract(reason: impl Into<String>) -> Self {
        Self::Contract(reason.into())
    }
}

impl From<MethodError> for TrainingError {
    fn from(err: MethodError) -> Self {
        match err {
            MethodError::Training(inner) => inner,
            MethodError::Model(inner) => inner.into(),
            MethodError::Dataset(inner) => inner.into(),
            other => Self::dataset(other.to_string()),
        }
    }
}

/// Result type for method operations.
pub type Result<T> = std::result::Result<T, MethodError>;
