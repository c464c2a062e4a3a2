//! Training lifecycle for image learning methods.
//!
//! This crate provides the training side of a learning method:
//!
//! # Training Components
//!
//! - [`TrainingConfig`] - Configuration for training runs
//! - [`Learner`] - Burn training loop over a [`BatchSource`]
//! - [`Learn`] - The interface [`fit_one_cycle`] drives
//! - [`TrainingMetrics`] - Metrics collected during training
//!
//! # Learning Rate Schedules
//!
//! - [`LearningRateSchedule`] - Per-step schedules (constant, step, cosine, ...)
//! - [`OneCycle`] - One-cycle parameters, built into a [`OneCycleSchedule`]
//! - [`fit_one_cycle`] - Fits under a one-cycle schedule, restoring the
//!   previous scheduler afterwards via [`ScheduleGuard`]
//!
//! # Loss Functions
//!
//! - [`LossFunction`] - Cross-entropy and binary cross-entropy on raw logits
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - Training pipelines
//! - Model evaluation
//! - Hyperparameter tuning
//!
//! # Example
//!
//! ```
//! use ml_training::OneCycle;
//!
//! let schedule = OneCycle::default().schedule(30).unwrap_or_else(|e| panic!("{e}"));
//! assert_eq!(schedule.peak(), 8);
//! assert_eq!(schedule.learning_rate(8), 0.01);
//! ```
//!
//! # Quality Standards
//!
//! This crate maintains A-grade standards per [STANDARDS.md](../../STANDARDS.md):
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod learner;
mod loss;
mod metrics;
mod one_cycle;
mod schedule;
mod trainer;

// Re-export configuration
pub use config::{LearningRateSchedule, OptimizerConfig, TrainingConfig};

// Re-export schedules
pub use one_cycle::{ScheduleGuard, fit_one_cycle};
pub use schedule::{OneCycle, OneCycleSchedule};

// Re-export loss functions
pub use loss::LossFunction;

// Re-export metrics
pub use metrics::{EpochMetrics, TrainingMetrics, accuracy, argmax};

// Re-export training loop
pub use learner::{Learner, batch_tensors};
pub use trainer::{BatchSource, Learn, TrainingState};

// Re-export error types
pub use error::{Result, TrainingError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        BatchSource, EpochMetrics, Learn, Learner, LearningRateSchedule, LossFunction, OneCycle,
        OneCycleSchedule, OptimizerConfig, ScheduleGuard, TrainingConfig, TrainingError,
        TrainingMetrics, TrainingState, fit_one_cycle,
    };
}
