//! Training state and the traits a training loop is driven through.

use ml_dataset::Batch;
use serde::{Deserialize, Serialize};

use crate::config::{LearningRateSchedule, TrainingConfig};
use crate::error::Result;
use crate::metrics::{EpochMetrics, TrainingMetrics};

/// A source of training or validation batches.
///
/// Implementations plan the sample order per epoch and encode batches on
/// demand.
pub trait BatchSource {
    /// Number of batches per epoch.
    fn steps_per_epoch(&self) -> usize;

    /// Prepares epoch `epoch` (e.g. reshuffles).
    fn start_epoch(&mut self, epoch: usize);

    /// Produces batch `step` of the current epoch.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` is out of range or encoding fails.
    fn batch(&mut self, step: usize) -> Result<Batch>;
}

/// Something that can be trained with an installable LR scheduler.
///
/// The scheduler slot overrides the learner's configured schedule while it
/// holds a value.
pub trait Learn {
    /// Prepares training bookkeeping. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the learner cannot be prepared.
    fn init_training(&mut self) -> Result<()>;

    /// Optimizer steps per training epoch.
    fn steps_per_epoch(&self) -> usize;

    /// The installed scheduler, if any.
    fn scheduler(&self) -> Option<&LearningRateSchedule>;

    /// Replaces the installed scheduler, returning the previous one.
    fn set_scheduler(
        &mut self,
        scheduler: Option<LearningRateSchedule>,
    ) -> Option<LearningRateSchedule>;

    /// Trains for `epochs` epochs.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the training loop.
    fn fit(&mut self, epochs: usize) -> Result<()>;
}

/// State of a training run.
///
/// # Example
///
/// ```
/// use ml_training::TrainingState;
///
/// let state = TrainingState::new();
/// assert_eq!(state.epoch, 0);
/// assert!(!state.is_finished());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Current epoch (0-indexed, counted across fits).
    pub epoch: usize,

    /// Current batch within epoch.
    pub batch: usize,

    /// Optimizer steps taken across all fits.
    pub global_step: usize,

    /// Epoch at which the current fit ends.
    pub total_epochs: usize,

    /// Best validation loss seen.
    pub best_val_loss: Option<f32>,

    /// Validations without improvement (for early stopping).
    pub epochs_without_improvement: usize,

    /// Whether training has finished.
    pub finished: bool,

    /// Learning rate applied at every optimizer step.
    pub learning_rates: Vec<f64>,

    /// Accumulated metrics.
    pub metrics: TrainingMetrics,
}

impl TrainingState {
    /// Creates a new training state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a training state for the given config.
    #[must_use]
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            total_epochs: config.epochs,
            ..Self::default()
        }
    }

    /// Returns true if training is finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the progress as a fraction [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.total_epochs == 0 {
            0.0
        } else {
            (self.epoch as f32 / self.total_epochs as f32).min(1.0)
        }
    }

    /// Extends the run by `epochs` from the current epoch.
    ///
    /// Patience is counted per fit: the best validation loss, the
    /// no-improvement counter and any early-stop mark are cleared.
    /// The accumulated metrics keep the overall best.
    pub fn begin_fit(&mut self, epochs: usize) {
        self.total_epochs = self.epoch + epochs;
        self.batch = 0;
        self.finished = epochs == 0;
        self.best_val_loss = None;
        self.epochs_without_improvement = 0;
        self.metrics.early_stopped = false;
        self.metrics.stop_reason = None;
    }

    /// Advances to the next epoch.
    pub fn next_epoch(&mut self) {
        self.epoch += 1;
        self.batch = 0;
        if self.epoch >= self.total_epochs {
            self.finished = true;
        }
    }

    /// Records an optimizer step taken at `lr`.
    pub fn next_step(&mut self, lr: f64) {
        self.batch += 1;
        self.global_step += 1;
        self.learning_rates.push(lr);
    }

    /// Records validation loss and checks for improvement.
    ///
    /// Returns true if this is a new best.
    pub fn record_val_loss(&mut self, val_loss: f32) -> bool {
        let improved = self.best_val_loss.map_or(true, |best| val_loss < best);

        if improved {
            self.best_val_loss = Some(val_loss);
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }

        improved
    }

    /// Checks if early stopping should trigger.
    #[must_use]
    pub const fn should_early_stop(&self, patience: usize) -> bool {
        patience > 0 && self.epochs_without_improvement >= patience
    }

    /// Marks training as early stopped.
    pub fn early_stop(&mut self, reason: impl Into<String>) {
        self.finished = true;
        self.metrics.set_early_stopped(reason);
    }

    /// Adds epoch metrics.
    pub fn add_epoch_metrics(&mut self, metrics: EpochMetrics) {
        self.metrics.add_epoch(metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_state_new() {
        let state = TrainingState::new();
        assert_eq!(state.epoch, 0);
        assert_eq!(state.global_step, 0);
        assert!(!state.is_finished());
        assert!(state.best_val_loss.is_none());
        assert!(state.learning_rates.is_empty());
    }

    #[test]
    fn training_state_from_config() {
        let state = TrainingState::from_config(&TrainingConfig::new(50));
        assert_eq!(state.total_epochs, 50);
    }

    #[test]
    fn training_state_progress() {
        let mut state = TrainingState::new();
        state.total_epochs = 10;

        assert!(state.progress().abs() < 1e-6);
        state.epoch = 5;
        assert!((state.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn training_state_begin_fit_extends_run() {
        let mut state = TrainingState::new();
        state.begin_fit(2);
        state.next_epoch();
        state.next_epoch();
        assert!(state.is_finished());

        state.begin_fit(3);
        assert!(!state.is_finished());
        assert_eq!(state.total_epochs, 5);
    }

    #[test]
    fn training_state_next_epoch() {
        let mut state = TrainingState::new();
        state.total_epochs = 2;
        state.batch = 10;

        state.next_epoch();
        assert_eq!(state.epoch, 1);
        assert_eq!(state.batch, 0);
        assert!(!state.is_finished());

        state.next_epoch();
        assert_eq!(state.epoch, 2);
        assert!(state.is_finished());
    }

    #[test]
    fn training_state_next_step_traces_lr() {
        let mut state = TrainingState::new();
        state.next_step(0.1);
        state.next_step(0.2);
        assert_eq!(state.batch, 2);
        assert_eq!(state.global_step, 2);
        assert_eq!(state.learning_rates, vec![0.1, 0.2]);
    }

    #[test]
    fn training_state_record_val_loss() {
        let mut state = TrainingState::new();

        assert!(state.record_val_loss(0.5));
        assert!(state.record_val_loss(0.3));
        assert_eq!(state.best_val_loss, Some(0.3));

        assert!(!state.record_val_loss(0.4));
        assert!(!state.record_val_loss(0.5));
        assert_eq!(state.epochs_without_improvement, 2);
    }

    #[test]
    fn training_state_early_stop_check() {
        let mut state = TrainingState::new();
        state.epochs_without_improvement = 5;

        assert!(!state.should_early_stop(10));
        assert!(state.should_early_stop(5));
        assert!(!state.should_early_stop(0)); // Disabled
    }

    #[test]
    fn training_state_early_stop() {
        let mut state = TrainingState::new();
        state.early_stop("no improvement");

        assert!(state.is_finished());
        assert!(state.metrics.early_stopped);
    }

    #[test]
    fn training_state_begin_fit_clears_early_stop() {
        let mut state = TrainingState::new();
        state.begin_fit(10);
        assert!(state.record_val_loss(0.5));
        assert!(!state.record_val_loss(0.6));
        assert!(state.should_early_stop(1));
        state.early_stop("no improvement");

        state.begin_fit(4);
        assert!(!state.is_finished());
        assert!(!state.should_early_stop(1));
        assert!(!state.metrics.early_stopped);
        assert!(state.metrics.stop_reason.is_none());
        // A worse loss than the previous fit's best still counts as a start.
        assert!(state.record_val_loss(0.7));
    }

    #[test]
    fn training_state_serialization() {
        let mut state = TrainingState::new();
        state.next_step(1e-3);
        let json = serde_json::to_string(&state).unwrap_or_default();
        let parsed: Option<TrainingState> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(state));
    }
}
