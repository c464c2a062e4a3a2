//! Burn model architectures for learning methods.
//!
//! This crate provides the trainable side of an image learning method,
//! built with the Burn framework.
//!
//! # Model Architectures
//!
//! - [`ConvBackbone`] - Stride-2 convolution stages producing a feature map
//! - [`ClassificationHead`] - Global average pooling plus a linear layer
//! - [`ImageClassifier`] - Backbone with a head sized by a probe forward pass
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - Training pipelines
//! - Inference servers
//! - CLI tools
//!
//! # Backend Support
//!
//! Models are generic over Burn backends. Common choices:
//! - `burn-ndarray` - CPU inference/training (default)
//! - `burn::backend::Autodiff<_>` - wraps any backend for training
//!
//! # Example
//!
//! ```ignore
//! use ml_models::{ConvBackboneConfig, ImageClassifier};
//!
//! let device = Default::default();
//! let backbone = ConvBackboneConfig::new(vec![16, 32]).init::<MyBackend>(&device)?;
//! let model = ImageClassifier::from_backbone(backbone, 3, (64, 64), &device)?;
//!
//! let logits = model.forward(Tensor::zeros([1, 3, 64, 64], &device));
//! assert_eq!(logits.dims(), [1, 3]);
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

mod backbone;
mod classifier;
mod error;

// Re-export model types
pub use backbone::{ConvBackbone, ConvBackboneConfig};
pub use classifier::{ClassificationHead, ImageClassifier};

// Re-export error types
pub use error::{ModelError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ClassificationHead, ConvBackbone, ConvBackboneConfig, ImageClassifier, ModelError,
    };
}
