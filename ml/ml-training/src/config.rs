//! Training configuration.

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::schedule::OneCycleSchedule;

/// Configuration for a training run.
///
/// # Example
///
/// ```
/// use ml_training::TrainingConfig;
///
/// let config = TrainingConfig::default();
/// assert_eq!(config.epochs, 10);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs for [`Learn::fit`](crate::Learn::fit) callers
    /// that do not pass one explicitly.
    pub epochs: usize,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Learning rate schedule used when no scheduler is installed.
    pub lr_schedule: LearningRateSchedule,

    /// Validation frequency (epochs between validations).
    pub val_frequency: usize,

    /// Early stopping patience (0 = disabled).
    pub early_stopping_patience: usize,

    /// Gradient clipping threshold on the gradient norm (0.0 = disabled).
    pub gradient_clip: f32,

    /// Random seed for the backend.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TrainingConfig {
    /// Creates a new training config with the given epochs.
    #[must_use]
    pub const fn new(epochs: usize) -> Self {
        Self {
            epochs,
            optimizer: OptimizerConfig::adam(1e-3),
            lr_schedule: LearningRateSchedule::Constant,
            val_frequency: 1,
            early_stopping_patience: 0,
            gradient_clip: 1.0,
            seed: None,
        }
    }

    /// Sets the optimizer.
    #[must_use]
    pub const fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sets the learning rate schedule.
    #[must_use]
    pub const fn with_lr_schedule(mut self, schedule: LearningRateSchedule) -> Self {
        self.lr_schedule = schedule;
        self
    }

    /// Sets the validation frequency.
    #[must_use]
    pub const fn with_val_frequency(mut self, val_frequency: usize) -> Self {
        self.val_frequency = val_frequency;
        self
    }

    /// Sets the early stopping patience.
    #[must_use]
    pub const fn with_early_stopping(mut self, patience: usize) -> Self {
        self.early_stopping_patience = patience;
        self
    }

    /// Sets the gradient clipping threshold.
    #[must_use]
    pub const fn with_gradient_clip(mut self, gradient_clip: f32) -> Self {
        self.gradient_clip = gradient_clip;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if all values are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.epochs > 0
            && self.val_frequency > 0
            && self.gradient_clip >= 0.0
            && self.optimizer.is_valid()
    }
}

/// Adam optimizer configuration.
///
/// # Example
///
/// ```
/// use ml_training::OptimizerConfig;
///
/// let adam = OptimizerConfig::adam(1e-3);
/// assert_eq!(adam.learning_rate, 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Base learning rate.
    pub learning_rate: f64,

    /// Weight decay (L2 penalty, 0.0 = disabled).
    pub weight_decay: f32,

    /// First moment decay.
    pub beta1: f32,

    /// Second moment decay.
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl OptimizerConfig {
    /// Creates an Adam optimizer config.
    #[must_use]
    pub const fn adam(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// Sets weight decay.
    #[must_use]
    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.learning_rate > 0.0
            && self.weight_decay >= 0.0
            && (0.0..1.0).contains(&self.beta1)
            && (0.0..1.0).contains(&self.beta2)
            && self.epsilon > 0.0
    }

    /// Maps this config onto burn's [`AdamConfig`].
    #[must_use]
    pub fn to_adam(&self, gradient_clip: f32) -> AdamConfig {
        let mut adam = AdamConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon);
        if self.weight_decay > 0.0 {
            adam = adam.with_weight_decay(Some(WeightDecayConfig::new(self.weight_decay)));
        }
        if gradient_clip > 0.0 {
            adam = adam.with_grad_clipping(Some(GradientClippingConfig::Norm(gradient_clip)));
        }
        adam
    }

    /// Builds the optimizer for module `M`.
    #[must_use]
    pub fn init<B: AutodiffBackend, M: AutodiffModule<B>>(
        &self,
        gradient_clip: f32,
    ) -> impl Optimizer<M, B> {
        self.to_adam(gradient_clip).init()
    }
}

/// Learning rate schedule, evaluated once per optimizer step.
///
/// # Example
///
/// ```
/// use ml_training::LearningRateSchedule;
///
/// let schedule = LearningRateSchedule::step(0.1, 30);
/// assert_eq!(schedule.compute_lr(1.0, 0, 100), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LearningRateSchedule {
    /// Constant learning rate.
    #[default]
    Constant,

    /// Step decay: multiply by factor every `step_size` steps.
    Step {
        /// Decay factor.
        factor: f64,
        /// Steps between decays.
        step_size: usize,
    },

    /// Exponential decay: lr * gamma^step.
    Exponential {
        /// Decay rate per step.
        gamma: f64,
    },

    /// Cosine annealing to minimum.
    Cosine {
        /// Minimum learning rate.
        min_lr: f64,
    },

    /// Linear warmup followed by cosine decay.
    WarmupCosine {
        /// Warmup steps.
        warmup_steps: usize,
        /// Minimum learning rate.
        min_lr: f64,
    },

    /// One-cycle schedule; ignores the base learning rate and run length.
    OneCycle(OneCycleSchedule),
}

impl LearningRateSchedule {
    /// Creates a step decay schedule.
    #[must_use]
    pub const fn step(factor: f64, step_size: usize) -> Self {
        Self::Step { factor, step_size }
    }

    /// Creates an exponential decay schedule.
    #[must_use]
    pub const fn exponential(gamma: f64) -> Self {
        Self::Exponential { gamma }
    }

    /// Creates a cosine annealing schedule.
    #[must_use]
    pub const fn cosine(min_lr: f64) -> Self {
        Self::Cosine { min_lr }
    }

    /// Creates a warmup + cosine schedule.
    #[must_use]
    pub const fn warmup_cosine(warmup_steps: usize, min_lr: f64) -> Self {
        Self::WarmupCosine {
            warmup_steps,
            min_lr,
        }
    }

    /// Computes the learning rate for a given step.
    ///
    /// # Arguments
    ///
    /// - `base_lr`: The base learning rate
    /// - `step`: Current optimizer step (0-indexed)
    /// - `total_steps`: Total number of steps in the run
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    pub fn compute_lr(&self, base_lr: f64, step: usize, total_steps: usize) -> f64 {
        match self {
            Self::Constant => base_lr,

            Self::Step { factor, step_size } => {
                let decays = step / (*step_size).max(1);
                base_lr * factor.powi(decays as i32)
            }

            Self::Exponential { gamma } => base_lr * gamma.powi(step as i32),

            Self::Cosine { min_lr } => {
                let progress = step as f64 / total_steps.max(1) as f64;
                let cosine = (std::f64::consts::PI * progress).cos();
                min_lr + (base_lr - min_lr) * (1.0 + cosine) / 2.0
            }

            Self::WarmupCosine {
                warmup_steps,
                min_lr,
            } => {
                if step < *warmup_steps {
                    base_lr * (step + 1) as f64 / *warmup_steps as f64
                } else {
                    let remaining = total_steps.saturating_sub(*warmup_steps);
                    let progress = (step - warmup_steps) as f64 / remaining.max(1) as f64;
                    let cosine = (std::f64::consts::PI * progress).cos();
                    min_lr + (base_lr - min_lr) * (1.0 + cosine) / 2.0
                }
            }

            Self::OneCycle(schedule) => schedule.learning_rate(step),
        }
    }
}

impl From<OneCycleSchedule> for LearningRateSchedule {
    fn from(schedule: OneCycleSchedule) -> Self {
        Self::OneCycle(schedule)
    }
}
