//! Dataset utilities for learning methods.
//!
//! This crate provides the dataset-side building blocks of a training run:
//!
//! # Samples and Splits
//!
//! - [`LabeledSample`] - A raw `(input, target)` pair
//! - [`split_dataset`] / [`split_stratified`] - Seeded train/validation splits
//! - [`LabelSummary`] - Per-label counts and balance
//!
//! # Batching
//!
//! - [`DataLoader`] - Per-epoch sample order and batch index planning
//! - [`Batch`] - Collated encoded inputs and targets
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no ML
//! framework dependency. It can be used in:
//! - Training pipelines
//! - Data preprocessing scripts
//! - Dataset validation tools
//!
//! # Example
//!
//! ```
//! use ml_dataset::{DataLoader, LoaderConfig, SplitRatio, split_dataset};
//!
//! let samples: Vec<u32> = (0..20).collect();
//! let (train, val) = split_dataset(&samples, SplitRatio::EIGHTY_TWENTY, Some(42));
//! assert_eq!((train.len(), val.len()), (16, 4));
//!
//! let loader = DataLoader::new(train.len(), LoaderConfig::default().with_batch_size(5));
//! assert_eq!(loader.map(|l| l.num_batches()).ok(), Some(4));
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

mod batch;
mod error;
mod loader;
mod sample;
mod splits;
mod summary;

// Re-export sample types
pub use sample::LabeledSample;

// Re-export split utilities
pub use splits::{SplitRatio, split_dataset, split_stratified};

// Re-export summary types
pub use summary::LabelSummary;

// Re-export batching
pub use batch::Batch;
pub use loader::{DataLoader, LoaderConfig};

// Re-export error types
pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        Batch, DataLoader, DatasetError, LabelSummary, LabeledSample, LoaderConfig, SplitRatio,
        split_dataset, split_stratified,
    };
}
