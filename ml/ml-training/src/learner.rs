//! Burn training loop for image classifiers.

use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::Backend;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use ml_dataset::Batch;
use ml_models::ImageClassifier;
use tracing::{debug, info, warn};

use crate::config::{LearningRateSchedule, TrainingConfig};
use crate::error::{Result, TrainingError};
use crate::loss::LossFunction;
use crate::metrics::{EpochMetrics, accuracy};
use crate::trainer::{BatchSource, Learn, TrainingState};

/// Converts a collated batch to `[n, c, h, w]` inputs and `[n, k]` targets.
///
/// # Errors
///
/// Returns an error if the batch is empty.
pub fn batch_tensors<B: Backend>(
    batch: &Batch,
    device: &B::Device,
) -> Result<(Tensor<B, 4>, Tensor<B, 2>)> {
    if batch.is_empty() {
        return Err(TrainingError::dataset("empty batch"));
    }
    let [n, h, w, c] = batch.input_shape;
    let inputs = Tensor::<B, 4>::from_data(
        TensorData::new(batch.inputs.clone(), [n, h, w, c]),
        device,
    )
    .permute([0, 3, 1, 2]);
    let targets = Tensor::<B, 2>::from_data(
        TensorData::new(batch.targets.clone(), [n, batch.num_outputs]),
        device,
    );
    Ok((inputs, targets))
}

/// Trains an [`ImageClassifier`] from a [`BatchSource`].
///
/// Each step computes the learning rate from the installed scheduler (or the
/// configured schedule when none is installed), then runs forward, loss,
/// backward, and an optimizer step. After each epoch the validation source,
/// if any, is scored with the inner (non-autodiff) model.
///
/// # Type Parameters
///
/// - `B`: Autodiff backend (e.g. `Autodiff<NdArray>`)
/// - `O`: Optimizer over the classifier
/// - `D`: Batch source for both training and validation
///
/// # Example
///
/// ```ignore
/// use ml_training::{Learner, OneCycle, TrainingConfig, fit_one_cycle};
///
/// let config = TrainingConfig::default();
/// let optimizer = config
///     .optimizer
///     .init::<MyBackend, ImageClassifier<MyBackend>>(config.gradient_clip);
/// let mut learner = Learner::new(model, optimizer, config, train, device)?
///     .with_validation(valid);
///
/// fit_one_cycle(&mut learner, 5, OneCycle::new(1e-2))?;
/// println!("{}", learner.state().metrics.summary());
/// ```
pub struct Learner<B: AutodiffBackend, O, D> {
    model: ImageClassifier<B>,
    optimizer: O,
    config: TrainingConfig,
    loss: LossFunction,
    train: D,
    valid: Option<D>,
    scheduler: Option<LearningRateSchedule>,
    state: TrainingState,
    initialized: bool,
    device: B::Device,
}

impl<B, O, D> Learner<B, O, D>
where
    B: AutodiffBackend,
    O: Optimizer<ImageClassifier<B>, B>,
    D: BatchSource,
{
    /// Creates a learner with cross-entropy loss and no validation source.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn new(
        model: ImageClassifier<B>,
        optimizer: O,
        config: TrainingConfig,
        train: D,
        device: B::Device,
    ) -> Result<Self> {
        if !config.is_valid() {
            return Err(TrainingError::invalid_config(format!("{config:?}")));
        }
        if let Some(seed) = config.seed {
            B::seed(seed);
        }
        let state = TrainingState::from_config(&config);
        Ok(Self {
            model,
            optimizer,
            config,
            loss: LossFunction::default(),
            train,
            valid: None,
            scheduler: None,
            state,
            initialized: false,
            device,
        })
    }

    /// Sets the validation source.
    #[must_use]
    pub fn with_validation(mut self, valid: D) -> Self {
        self.valid = Some(valid);
        self
    }

    /// Sets the loss function.
    #[must_use]
    pub fn with_loss(mut self, loss: LossFunction) -> Self {
        self.loss = loss;
        self
    }

    /// The model being trained.
    #[must_use]
    pub const fn model(&self) -> &ImageClassifier<B> {
        &self.model
    }

    /// Consumes the learner, returning the trained model.
    #[must_use]
    pub fn into_model(self) -> ImageClassifier<B> {
        self.model
    }

    /// Training configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Loss function in use.
    #[must_use]
    pub const fn loss_function(&self) -> LossFunction {
        self.loss
    }

    /// Run state, including the learning rate trace and metrics.
    #[must_use]
    pub const fn state(&self) -> &TrainingState {
        &self.state
    }

    /// Learning rate for `step` of a fit of `total_steps` steps.
    #[must_use]
    pub fn learning_rate(&self, step: usize, total_steps: usize) -> f64 {
        let schedule = self.scheduler.as_ref().unwrap_or(&self.config.lr_schedule);
        schedule.compute_lr(self.config.optimizer.learning_rate, step, total_steps)
    }

    fn check_batch(&self, batch: &Batch) -> Result<()> {
        let channels = batch.input_shape[3];
        if channels != self.model.in_channels() {
            return Err(TrainingError::model(format!(
                "batch has {channels} channels, model expects {}",
                self.model.in_channels()
            )));
        }
        if batch.num_outputs != self.model.num_classes() {
            return Err(TrainingError::model(format!(
                "batch has {} outputs, model predicts {}",
                batch.num_outputs,
                self.model.num_classes()
            )));
        }
        Ok(())
    }

    fn train_step(&mut self, batch: &Batch, lr: f64) -> Result<f32> {
        self.check_batch(batch)?;
        let (inputs, targets) = batch_tensors::<B>(batch, &self.device)?;

        let logits = self.model.forward(inputs);
        let loss = self.loss.forward(logits, targets);
        let value: f32 = loss.clone().into_scalar().elem();
        if !value.is_finite() {
            return Err(TrainingError::numerical_instability(format!(
                "loss is {value} at step {}",
                self.state.global_step
            )));
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(lr, self.model.clone(), grads);
        Ok(value)
    }

    /// Scores the validation source: `(mean loss, top-1 accuracy)`.
    ///
    /// Returns `None` without a validation source or when it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a validation batch cannot be produced or scored.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&mut self) -> Result<Option<(f32, f32)>> {
        let Some(valid) = self.valid.as_mut() else {
            return Ok(None);
        };
        let steps = valid.steps_per_epoch();
        if steps == 0 {
            warn!("validation source has no batches, skipping validation");
            return Ok(None);
        }

        let model = self.model.valid();
        valid.start_epoch(0);

        let mut loss_sum = 0.0_f32;
        let mut accuracy_sum = 0.0_f32;
        let mut samples = 0_usize;
        for step in 0..steps {
            let batch = valid.batch(step)?;
            let (inputs, targets) = batch_tensors::<B::InnerBackend>(&batch, &self.device)?;
            let logits = model.forward(inputs);
            let loss: f32 = self
                .loss
                .forward(logits.clone(), targets)
                .into_scalar()
                .elem();
            let scores = logits
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|err| TrainingError::model(format!("{err:?}")))?;

            let n = batch.len();
            loss_sum += loss * n as f32;
            accuracy_sum += accuracy(&scores, batch.num_outputs, &batch.target_classes()) * n as f32;
            samples += n;
        }

        if samples == 0 {
            return Ok(None);
        }
        Ok(Some((
            loss_sum / samples as f32,
            accuracy_sum / samples as f32,
        )))
    }

    fn should_validate(&self, epoch: usize) -> bool {
        (epoch + 1) % self.config.val_frequency == 0
    }

    #[allow(clippy::cast_precision_loss)]
    fn run_epoch(&mut self, run_step: &mut usize, total_steps: usize) -> Result<EpochMetrics> {
        let epoch = self.state.epoch;
        let steps = self.train.steps_per_epoch();
        let started = Instant::now();

        self.train.start_epoch(epoch);
        let mut loss_sum = 0.0_f32;
        let mut lr = 0.0;
        for step in 0..steps {
            let batch = self.train.batch(step)?;
            lr = self.learning_rate(*run_step, total_steps);
            let loss = self.train_step(&batch, lr)?;

            debug!(epoch, step, lr, loss, "train step");
            self.state.next_step(lr);
            loss_sum += loss;
            *run_step += 1;
        }
        let train_time = started.elapsed().as_secs_f32();

        let mut metrics = EpochMetrics::new(epoch, loss_sum / steps.max(1) as f32, None)
            .with_learning_rate(lr)
            .with_steps(steps)
            .with_train_time(train_time);

        if self.should_validate(epoch) {
            let started = Instant::now();
            if let Some((val_loss, val_accuracy)) = self.validate()? {
                metrics.val_loss = Some(val_loss);
                metrics = metrics
                    .with_val_accuracy(val_accuracy)
                    .with_val_time(started.elapsed().as_secs_f32());
                self.state.record_val_loss(val_loss);
            }
        }
        Ok(metrics)
    }
}

impl<B, O, D> Learn for Learner<B, O, D>
where
    B: AutodiffBackend,
    O: Optimizer<ImageClassifier<B>, B>,
    D: BatchSource,
{
    fn init_training(&mut self) -> Result<()> {
        if !self.initialized {
            self.state = TrainingState::from_config(&self.config);
            self.initialized = true;
            debug!(
                steps_per_epoch = self.train.steps_per_epoch(),
                has_validation = self.valid.is_some(),
                "training initialized"
            );
        }
        Ok(())
    }

    fn steps_per_epoch(&self) -> usize {
        self.train.steps_per_epoch()
    }

    fn scheduler(&self) -> Option<&LearningRateSchedule> {
        self.scheduler.as_ref()
    }

    fn set_scheduler(
        &mut self,
        scheduler: Option<LearningRateSchedule>,
    ) -> Option<LearningRateSchedule> {
        std::mem::replace(&mut self.scheduler, scheduler)
    }

    fn fit(&mut self, epochs: usize) -> Result<()> {
        if epochs == 0 {
            return Err(TrainingError::invalid_config("epochs must be > 0"));
        }
        self.init_training()?;
        let steps = self.train.steps_per_epoch();
        if steps == 0 {
            return Err(TrainingError::dataset("training source has no batches"));
        }
        let total_steps = epochs * steps;

        info!(
            epochs,
            steps_per_epoch = steps,
            total_steps,
            loss = %self.loss,
            scheduled = self.scheduler.is_some(),
            "starting fit"
        );
        self.state.begin_fit(epochs);

        let mut run_step = 0;
        while !self.state.is_finished() {
            let metrics = self.run_epoch(&mut run_step, total_steps)?;
            info!(
                epoch = metrics.epoch,
                train_loss = metrics.train_loss,
                val_loss = ?metrics.val_loss,
                val_accuracy = ?metrics.val_accuracy,
                lr = metrics.learning_rate,
                "epoch complete"
            );
            self.state.add_epoch_metrics(metrics);
            self.state.next_epoch();

            let patience = self.config.early_stopping_patience;
            if !self.state.is_finished() && self.state.should_early_stop(patience) {
                info!(patience, epoch = self.state.epoch, "early stopping");
                self.state
                    .early_stop(format!("no validation improvement for {patience} epochs"));
            }
        }

        info!(
            epochs_completed = self.state.metrics.epochs_completed(),
            final_loss = self.state.metrics.final_loss(),
            "fit finished"
        );
        Ok(())
    }
}
