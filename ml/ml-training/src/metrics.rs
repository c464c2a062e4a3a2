//! Training metrics.

use serde::{Deserialize, Serialize};

/// Metrics for a single training epoch.
///
/// # Example
///
/// ```
/// use ml_training::EpochMetrics;
///
/// let metrics = EpochMetrics::new(0, 0.5, Some(0.4)).with_val_accuracy(0.75);
/// assert_eq!(metrics.epoch, 0);
/// assert_eq!(metrics.val_accuracy, Some(0.75));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (0-indexed).
    pub epoch: usize,

    /// Mean training loss over the epoch's steps.
    pub train_loss: f32,

    /// Validation loss (if computed).
    pub val_loss: Option<f32>,

    /// Validation top-1 accuracy (if computed).
    pub val_accuracy: Option<f32>,

    /// Learning rate of the last step.
    pub learning_rate: f64,

    /// Optimizer steps taken.
    pub steps: usize,

    /// Training time in seconds.
    pub train_time_secs: f32,

    /// Validation time in seconds.
    pub val_time_secs: Option<f32>,
}

impl EpochMetrics {
    /// Creates new epoch metrics.
    #[must_use]
    pub const fn new(epoch: usize, train_loss: f32, val_loss: Option<f32>) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
            val_accuracy: None,
            learning_rate: 0.0,
            steps: 0,
            train_time_secs: 0.0,
            val_time_secs: None,
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the validation accuracy.
    #[must_use]
    pub const fn with_val_accuracy(mut self, accuracy: f32) -> Self {
        self.val_accuracy = Some(accuracy);
        self
    }

    /// Sets the step count.
    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the training time.
    #[must_use]
    pub const fn with_train_time(mut self, secs: f32) -> Self {
        self.train_time_secs = secs;
        self
    }

    /// Sets the validation time.
    #[must_use]
    pub const fn with_val_time(mut self, secs: f32) -> Self {
        self.val_time_secs = Some(secs);
        self
    }

    /// Returns total time (train + val) in seconds.
    #[must_use]
    pub fn total_time_secs(&self) -> f32 {
        self.train_time_secs + self.val_time_secs.unwrap_or(0.0)
    }

    /// Returns true if validation loss improved (is lower than previous best).
    #[must_use]
    pub fn val_improved(&self, previous_best: Option<f32>) -> bool {
        match (self.val_loss, previous_best) {
            (Some(current), Some(best)) => current < best,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Aggregate metrics for a training run.
///
/// # Example
///
/// ```
/// use ml_training::{EpochMetrics, TrainingMetrics};
///
/// let mut metrics = TrainingMetrics::new();
/// metrics.add_epoch(EpochMetrics::new(0, 0.5, Some(0.4)));
/// metrics.add_epoch(EpochMetrics::new(1, 0.3, Some(0.35)));
///
/// assert_eq!(metrics.epochs_completed(), 2);
/// assert!((metrics.final_loss() - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Metrics for each epoch.
    pub epoch_metrics: Vec<EpochMetrics>,

    /// Best validation loss seen.
    pub best_val_loss: Option<f32>,

    /// Epoch with best validation loss.
    pub best_epoch: Option<usize>,

    /// Total training time in seconds.
    pub total_time_secs: f32,

    /// Whether training was early stopped.
    pub early_stopped: bool,

    /// Reason for stopping (if not completed normally).
    pub stop_reason: Option<String>,
}

impl TrainingMetrics {
    /// Creates new empty training metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metrics for an epoch.
    pub fn add_epoch(&mut self, metrics: EpochMetrics) {
        if metrics.val_improved(self.best_val_loss) {
            self.best_val_loss = metrics.val_loss;
            self.best_epoch = Some(metrics.epoch);
        }
        self.total_time_secs += metrics.total_time_secs();
        self.epoch_metrics.push(metrics);
    }

    /// Returns the number of completed epochs.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epoch_metrics.len()
    }

    /// Returns the final training loss.
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.epoch_metrics.last().map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the final validation accuracy.
    #[must_use]
    pub fn final_val_accuracy(&self) -> Option<f32> {
        self.epoch_metrics.last().and_then(|m| m.val_accuracy)
    }

    /// Returns the initial training loss.
    #[must_use]
    pub fn initial_loss(&self) -> f32 {
        self.epoch_metrics
            .first()
            .map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the loss improvement ratio.
    #[must_use]
    pub fn loss_improvement(&self) -> f32 {
        let initial = self.initial_loss();
        let final_loss = self.final_loss();
        if initial > 0.0 && !initial.is_nan() && !final_loss.is_nan() {
            1.0 - (final_loss / initial)
        } else {
            0.0
        }
    }

    /// Returns training losses as a vector.
    #[must_use]
    pub fn train_losses(&self) -> Vec<f32> {
        self.epoch_metrics.iter().map(|m| m.train_loss).collect()
    }

    /// Returns validation losses as a vector.
    #[must_use]
    pub fn val_losses(&self) -> Vec<Option<f32>> {
        self.epoch_metrics.iter().map(|m| m.val_loss).collect()
    }

    /// Marks training as early stopped.
    pub fn set_early_stopped(&mut self, reason: impl Into<String>) {
        self.early_stopped = true;
        self.stop_reason = Some(reason.into());
    }

    /// Returns a human-readable summary.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let _ = writeln!(s, "Training Summary");
        let _ = writeln!(s, "================");
        let _ = writeln!(s, "Epochs completed: {}", self.epochs_completed());
        let _ = writeln!(s, "Total time: {:.1}s", self.total_time_secs);
        let _ = writeln!(
            s,
            "Initial loss: {:.4} -> Final loss: {:.4}",
            self.initial_loss(),
            self.final_loss()
        );

        if let Some(best) = self.best_val_loss {
            let _ = writeln!(
                s,
                "Best val loss: {:.4} (epoch {})",
                best,
                self.best_epoch.unwrap_or(0)
            );
        }
        if let Some(accuracy) = self.final_val_accuracy() {
            let _ = writeln!(s, "Final val accuracy: {:.1}%", accuracy * 100.0);
        }
        if self.early_stopped {
            let _ = writeln!(
                s,
                "Early stopped: {}",
                self.stop_reason.as_deref().unwrap_or("yes")
            );
        }

        s
    }
}

/// Index of the largest score, lowest index on ties. `NaN` never wins.
///
/// Returns `None` for an empty or all-`NaN` row.
#[must_use]
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Top-1 accuracy of `scores` rows of `num_outputs` against class indices.
///
/// Returns 0.0 when there is nothing to score.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(scores: &[f32], num_outputs: usize, classes: &[usize]) -> f32 {
    if num_outputs == 0 || classes.is_empty() {
        return 0.0;
    }
    let correct = scores
        .chunks_exact(num_outputs)
        .zip(classes)
        .filter(|&(row, &class)| argmax(row) == Some(class))
        .count();
    correct as f32 / classes.len() as f32
}
