//! Error types for ml-types crate.

use thiserror::Error;

/// Errors that can occur in ml-types operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MlTypesError {
    /// Invalid image dimensions.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    DataSizeMismatch {
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// Channel count does not match the color type.
    #[error("channel mismatch: expected {expected}, got {actual}")]
    ChannelMismatch {
        /// Expected channel count.
        expected: usize,
        /// Actual channel count.
        actual: usize,
    },

    /// Invalid normalization statistics.
    #[error("invalid statistics: {0}")]
    InvalidStats(String),
}

impl MlTypesError {
    /// Creates an invalid dimensions error.
    #[must_use]
    pub const fn invalid_dimensions(width: usize, height: usize) -> Self {
        Self::InvalidDimensions { width, height }
    }

    /// Creates a data size mismatch error.
    #[must_use]
    pub const fn data_size_mismatch(expected: usize, actual: usize) -> Self {
        Self::DataSizeMismatch { expected, actual }
    }

    /// Creates a channel mismatch error.
    #[must_use]
    pub const fn channel_mismatch(expected: usize, actual: usize) -> Self {
        Self::ChannelMismatch { expected, actual }
    }

    /// Creates an invalid statistics error.
    #[must_use]
    pub fn invalid_stats(reason: impl Into<String>) -> Self {
        Self::InvalidStats(reason.into())
    }
}

/// Result type for ml-types operations.
pub type Result<T> = std::result::Result<T, MlTypesError>;
