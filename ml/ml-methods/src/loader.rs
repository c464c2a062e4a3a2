//! Batches of encoded samples for a learning method.

use ml_dataset::{Batch, DataLoader, LabeledSample, LoaderConfig};
use ml_training::{BatchSource, TrainingError};
use ml_types::{ColorType, Context, Image};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::{MethodError, Result};
use crate::method::LearningMethod;

/// Encodes a method's samples batch by batch.
///
/// Every sample is encoded with its own RNG seeded from the loader seed,
/// the context, the epoch, and the sample index, so a given epoch always
/// produces the same batches. With a buffered method one scratch image is
/// reused for every sample.
///
/// # Example
///
/// ```
/// use ml_dataset::{LabeledSample, LoaderConfig};
/// use ml_methods::{ImageClassification, MethodDataLoader};
/// use ml_training::BatchSource;
/// use ml_types::{ColorType, Context, Image};
///
/// let method = ImageClassification::new(vec!["a", "b"], 8, 8).unwrap_or_else(|e| panic!("{e}"));
/// let samples = vec![
///     LabeledSample::new(Image::filled(10, 10, ColorType::Rgb, 0.1), "a"),
///     LabeledSample::new(Image::filled(12, 9, ColorType::Rgb, 0.9), "b"),
///     LabeledSample::new(Image::filled(16, 16, ColorType::Rgb, 0.5), "a"),
/// ];
///
/// let config = LoaderConfig::default().with_batch_size(2);
/// let mut loader = MethodDataLoader::new(method, samples, Context::Training, config)
///     .unwrap_or_else(|e| panic!("{e}"));
/// assert_eq!(loader.steps_per_epoch(), 2);
///
/// loader.start_epoch(0);
/// let batch = loader.batch(0).ok();
/// assert_eq!(batch.map(|b| b.input_shape), Some([2, 8, 8, 3]));
/// ```
#[derive(Debug, Clone)]
pub struct MethodDataLoader<M: LearningMethod> {
    method: M,
    samples: Vec<LabeledSample<M::Input, M::Target>>,
    context: Context,
    loader: DataLoader,
    seed: u64,
    scratch: Option<Image>,
    target: Vec<f32>,
}

impl<M: LearningMethod<Input = Image>> MethodDataLoader<M> {
    /// Creates a loader over `samples`, encoding in `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader config is invalid.
    pub fn new(
        method: M,
        samples: Vec<LabeledSample<Image, M::Target>>,
        context: Context,
        config: LoaderConfig,
    ) -> Result<Self> {
        let loader = DataLoader::new(samples.len(), config)?;
        let scratch = method.buffered().then(|| {
            let (h, w, c) = method.input_dims();
            let color = if c == 1 { ColorType::Gray } else { ColorType::Rgb };
            Image::zeros(w, h, color)
        });
        let target = vec![0.0; method.num_outputs()];
        debug!(
            samples = samples.len(),
            context = %context,
            batches = loader.num_batches(),
            buffered = scratch.is_some(),
            "method data loader ready"
        );
        Ok(Self {
            seed: config.seed,
            method,
            samples,
            context,
            loader,
            scratch,
            target,
        })
    }

    /// A training loader: shuffled, augmenting.
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` is 0.
    pub fn training(
        method: M,
        samples: Vec<LabeledSample<Image, M::Target>>,
        batch_size: usize,
        seed: u64,
    ) -> Result<Self> {
        let config = LoaderConfig::default()
            .with_batch_size(batch_size)
            .with_seed(seed);
        Self::new(method, samples, Context::Training, config)
    }

    /// A validation loader: fixed order, deterministic encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` is 0.
    pub fn validation(
        method: M,
        samples: Vec<LabeledSample<Image, M::Target>>,
        batch_size: usize,
    ) -> Result<Self> {
        let config = LoaderConfig::default()
            .with_batch_size(batch_size)
            .with_shuffle(false);
        Self::new(method, samples, Context::Validation, config)
    }

    /// The method samples are encoded with.
    #[must_use]
    pub const fn method(&self) -> &M {
        &self.method
    }

    /// Encoding context.
    #[must_use]
    pub const fn context(&self) -> Context {
        self.context
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn sample_seed(&self, index: usize) -> u64 {
        let context = match self.context {
            Context::Training => 1_u64,
            Context::Validation => 2,
            Context::Inference => 3,
        };
        let mut x = self.seed
            ^ context.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ self.loader.epoch().wrapping_mul(0xBF58_476D_1CE4_E5B9)
            ^ (index as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
        // splitmix64 finalizer
        x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^ (x >> 31)
    }

    /// Encodes batch `step` of the current epoch.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` is out of range or a sample fails to
    /// encode (e.g. an unknown class).
    pub fn encode_batch(&mut self, step: usize) -> Result<Batch> {
        let indices = self.loader.batch_indices(step)?.to_vec();
        let mut batch = Batch::with_shape(
            self.method.input_dims(),
            self.method.num_outputs(),
            indices.len(),
        );

        for index in indices {
            let sample = self
                .samples
                .get(index)
                .ok_or_else(|| MethodError::invalid_config(format!("no sample {index}")))?;
            let mut rng = ChaCha8Rng::seed_from_u64(self.sample_seed(index));

            self.method
                .encode_target_into(self.context, &sample.target, &mut self.target)?;
            match self.scratch.as_mut() {
                Some(scratch) => {
                    self.method
                        .encode_input_into(self.context, &sample.input, &mut rng, scratch)?;
                    batch.push(scratch, &self.target)?;
                }
                None => {
                    let x = self.method.encode_input(self.context, &sample.input, &mut rng)?;
                    batch.push(&x, &self.target)?;
                }
            }
        }
        Ok(batch)
    }
}

impl<M: LearningMethod<Input = Image>> BatchSource for MethodDataLoader<M> {
    fn steps_per_epoch(&self) -> usize {
        self.loader.num_batches()
    }

    fn start_epoch(&mut self, epoch: usize) {
        self.loader.start_epoch(epoch as u64);
    }

    fn batch(&mut self, step: usize) -> ml_training::Result<Batch> {
        self.encode_batch(step).map_err(TrainingError::from)
    }
}
