//! Error types for ml-transforms crate.

use thiserror::Error;

/// Errors that can occur while configuring or running transforms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Invalid transform configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input image cannot be transformed.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A projection could not be solved or inverted.
    #[error("singular projection: {0}")]
    SingularProjection(String),
}

impl TransformError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid image error.
    #[must_use]
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage(reason.into())
    }

    /// Creates a singular projection error.
    #[must_use]
    pub fn singular_projection(reason: impl Into<String>) -> Self {
        Self::SingularProjection(reason.into())
    }
}

impl From<ml_types::MlTypesError> for TransformError {
    fn from(err: ml_types::MlTypesError) -> Self {
        Self::InvalidImage(err.to_string())
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
