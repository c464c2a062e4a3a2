//! Batch index planning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Data loader configuration.
///
/// # Example
///
/// ```
/// use ml_dataset::LoaderConfig;
///
/// let config = LoaderConfig::default().with_batch_size(16).with_drop_last(true);
/// assert_eq!(config.batch_size, 16);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Samples per batch.
    pub batch_size: usize,

    /// Reshuffle the sample order every epoch.
    pub shuffle: bool,

    /// Drop the trailing partial batch.
    pub drop_last: bool,

    /// Base seed; epoch `e` shuffles with `seed + e`.
    pub seed: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            seed: 42,
        }
    }
}

impl LoaderConfig {
    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets shuffling.
    #[must_use]
    pub const fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Sets whether the partial trailing batch is dropped.
    #[must_use]
    pub const fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns `true` if the batch size is non-zero.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.batch_size > 0
    }
}

/// Plans which samples make up each batch of an epoch.
///
/// The loader only deals in indices; callers fetch and encode the samples.
///
/// # Example
///
/// ```
/// use ml_dataset::{DataLoader, LoaderConfig};
///
/// let config = LoaderConfig::default().with_batch_size(4).with_shuffle(false);
/// let loader = DataLoader::new(10, config);
/// let loader = loader.ok();
///
/// assert_eq!(loader.as_ref().map(DataLoader::num_batches), Some(3));
/// let last = loader.as_ref().and_then(|l| l.batch_indices(2).ok());
/// assert_eq!(last, Some(&[8, 9][..]));
/// ```
#[derive(Debug, Clone)]
pub struct DataLoader {
    config: LoaderConfig,
    order: Vec<usize>,
    epoch: u64,
}

impl DataLoader {
    /// Creates a loader over `len` samples, planned for epoch 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size is zero.
    pub fn new(len: usize, config: LoaderConfig) -> Result<Self> {
        if !config.is_valid() {
            return Err(DatasetError::invalid_batch_size(config.batch_size));
        }
        let mut loader = Self {
            config,
            order: (0..len).collect(),
            epoch: 0,
        };
        loader.start_epoch(0);
        Ok(loader)
    }

    /// Loader configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Batches per epoch.
    #[must_use]
    pub fn num_batches(&self) -> usize {
        let len = self.order.len();
        if self.config.drop_last {
            len / self.config.batch_size
        } else {
            len.div_ceil(self.config.batch_size)
        }
    }

    /// Replans the sample order for `epoch`.
    ///
    /// The order depends only on the seed and the epoch number.
    pub fn start_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
        self.order.sort_unstable();
        if self.config.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(epoch));
            self.order.shuffle(&mut rng);
        }
    }

    /// Sample order of the current epoch.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Sample indices of batch `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if `step >= num_batches()`.
    pub fn batch_indices(&self, step: usize) -> Result<&[usize]> {
        let num_batches = self.num_batches();
        if step >= num_batches {
            return Err(DatasetError::step_out_of_range(step, num_batches));
        }
        let start = step * self.config.batch_size;
        let end = (start + self.config.batch_size).min(self.order.len());
        Ok(&self.order[start..end])
    }
}
