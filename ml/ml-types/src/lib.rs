//! Shared types for the CortenForge learning-method crates.
//!
//! This crate provides the small vocabulary every other `ml-*` crate speaks:
//!
//! # Image Types
//!
//! - [`Image`] - Dense HWC pixel grid with values in `[0, 1]`
//! - [`ColorType`] - Gray or RGB channel layout
//!
//! # Encoding Context
//!
//! - [`Context`] - Training, validation, or inference mode
//!
//! # Preprocessing Types
//!
//! - [`ImageStats`] - Per-channel normalization statistics (mean, std)
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no ML
//! framework dependency. It can be used in:
//! - Training pipelines
//! - Inference servers
//! - Dataset tools
//!
//! # Example
//!
//! ```
//! use ml_types::{ColorType, Context, Image, ImageStats};
//!
//! let image = Image::filled(4, 3, ColorType::Rgb, 0.5);
//! assert_eq!(image.dims(), (3, 4, 3));
//!
//! let stats = ImageStats::ZERO_CENTERED;
//! assert!(stats.normalize(image.get(0, 0, 0), 0).abs() < 1e-6);
//!
//! assert!(Context::Training.augments());
//! assert!(!Context::Inference.augments());
//! ```
//!
//! # Quality Standards
//!
//! This crate maintains A-grade standards per [STANDARDS.md](../../STANDARDS.md):
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod context;
mod error;
mod image;
mod stats;

// Re-export image types
pub use image::{ColorType, Image};

// Re-export context
pub use context::Context;

// Re-export preprocessing types
pub use stats::ImageStats;

// Re-export error types
pub use error::{MlTypesError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{ColorType, Context, Image, ImageStats, MlTypesError};
}
