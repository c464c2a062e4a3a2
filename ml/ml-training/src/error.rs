//! Error types for ml-training crate.

use thiserror::Error;

/// Errors that can occur during training.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingError {
    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset error.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Model error.
    #[error("model error: {0}")]
    Model(String),

    /// Loss computation error.
    #[error("loss error: {0}")]
    Loss(String),

    /// Training was interrupted.
    #[error("training interrupted: {0}")]
    Interrupted(String),

    /// Numerical instability detected.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a dataset error.
    #[must_use]
    pub fn dataset(reason: impl Into<String>) -> Self {
        Self::Dataset(reason.into())
    }

    /// Creates a model error.
    #[must_use]
    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model(reason.into())
    }

    /// Creates a loss error.
    #[must_use]
    pub fn loss(reason: impl Into<String>) -> Self {
        Self::Loss(reason.into())
    }

    /// Creates an interrupted error.
    #[must_use]
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted(reason.into())
    }

    /// Creates a numerical instability error.
    #[must_use]
    pub fn numerical_instability(reason: impl Into<String>) -> Self {
        Self::NumericalInstability(reason.into())
    }
}

impl From<ml_dataset::DatasetError> for TrainingError {
    fn from(err: ml_dataset::DatasetError) -> Self {
        Self::Dataset(err.to_string())
    }
}

impl From<ml_models::ModelError> for TrainingError {
    fn from(err: ml_models::ModelError) -> Self {
        Self::Model(err.to_string())
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;
