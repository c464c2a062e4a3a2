//! Learning methods for image tasks.
//!
//! A learning method ties raw samples to a trainable model: it encodes
//! inputs and targets, decodes model outputs, builds a model from a
//! backbone, and picks the loss to train with.
//!
//! # Method Interface
//!
//! - [`LearningMethod`] - Encode, decode, build model, loss function
//! - [`MockMethod`] - Random samples and a [`MockClassifier`] for testing
//! - [`check_method`] - Verifies a method's encode/decode contract
//!
//! # Methods
//!
//! - [`ImageClassification`] - One class per image, softmax cross-entropy
//! - [`ImageMultiLabel`] - Any subset of classes, sigmoid binary cross-entropy
//!
//! # Data
//!
//! - [`ImageEncoding`] - Projective transforms followed by preprocessing
//! - [`MethodDataLoader`] - Encoded batches for a [`Learner`](ml_training::Learner)
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - Training pipelines
//! - Inference servers
//! - CLI tools
//!
//! # Example
//!
//! ```
//! use ml_methods::{ImageClassification, LearningMethod};
//! use ml_types::{ColorType, Context, Image};
//! use rand::SeedableRng;
//!
//! let method = ImageClassification::new(vec!["cat", "dog", "bird"], 32, 32)
//!     .unwrap_or_else(|e| panic!("{e}"));
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
//!
//! let image = Image::filled(48, 40, ColorType::Rgb, 0.5);
//! let x = method.encode_input(Context::Validation, &image, &mut rng).ok();
//! assert_eq!(x.map(|x| x.dims()), Some((32, 32, 3)));
//!
//! let y = method.encode_target(Context::Training, &"bird").ok();
//! assert_eq!(y, Some(vec![0.0, 0.0, 1.0]));
//!
//! let label = method.decode_prediction(Context::Inference, &[2.0, -1.0, 0.5]).ok();
//! assert_eq!(label, Some("cat"));
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

mod check;
mod classes;
mod classification;
mod encoding;
mod error;
mod loader;
mod method;
mod mock;
mod multilabel;

// Re-export the method interface
pub use check::check_method;
pub use method::{LearningMethod, MockMethod};
pub use mock::MockClassifier;

// Re-export methods
pub use classes::Classes;
pub use classification::ImageClassification;
pub use multilabel::ImageMultiLabel;

// Re-export data plumbing
pub use encoding::ImageEncoding;
pub use loader::MethodDataLoader;

// Re-export error types
pub use error::{MethodError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        Classes, ImageClassification, ImageEncoding, ImageMultiLabel, LearningMethod,
        MethodDataLoader, MethodError, MockClassifier, MockMethod, check_method,
    };
}
