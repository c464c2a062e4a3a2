//! Image transforms for learning-method encodings.
//!
//! This crate turns raw [`ml_types::Image`]s into fixed-size, normalized
//! model inputs:
//!
//! # Geometry
//!
//! - [`ProjectiveTransforms`] - Crop/resize to a fixed size with random
//!   geometric augmentation in training
//! - [`ProjectiveAugmentation`] - Flip, rotate, zoom, perspective
//! - [`Projection`] - 3x3 homography with bilinear warping
//!
//! # Preprocessing
//!
//! - [`ImagePreprocessing`] - Color conversion, photometric augmentation,
//!   normalization
//! - [`PhotometricAugmentation`] - Brightness, contrast, noise
//!
//! # Composition
//!
//! [`Transform`] is implemented for pairs, so `(projective, preprocessing)`
//! is itself a transform and [`run`] executes it.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no ML
//! framework dependency.
//!
//! # Example
//!
//! ```
//! use ml_transforms::{ImagePreprocessing, ProjectiveTransforms, run};
//! use ml_types::{ColorType, Context, Image, ImageStats};
//! use rand::SeedableRng;
//!
//! let pipeline = (
//!     ProjectiveTransforms::new(32, 32),
//!     ImagePreprocessing::new(ImageStats::IMAGENET),
//! );
//! let image = Image::filled(50, 40, ColorType::Gray, 0.5);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//!
//! let x = run(&pipeline, Context::Validation, &image, &mut rng);
//! assert_eq!(x.map(|x| x.dims()).ok(), Some((32, 32, 3)));
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

mod error;
mod preprocessing;
mod projection;
mod projective;
mod transform;

// Re-export transform interface
pub use transform::{Transform, run};

// Re-export geometry
pub use projection::Projection;
pub use projective::{ProjectiveAugmentation, ProjectiveTransforms, ResizeMode};

// Re-export preprocessing
pub use preprocessing::{ImagePreprocessing, PhotometricAugmentation};

// Re-export error types
pub use error::{Result, TransformError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ImagePreprocessing, PhotometricAugmentation, ProjectiveAugmentation,
        ProjectiveTransforms, ResizeMode, Transform, TransformError, run,
    };
}
