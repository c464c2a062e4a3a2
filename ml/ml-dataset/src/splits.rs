//! Dataset splitting utilities.

use std::collections::HashMap;
use std::hash::Hash;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Ratio for splitting datasets into train/validation sets.
///
/// The ratio specifies the proportion of data used for training; the
/// remainder goes to validation.
///
/// # Example
///
/// ```
/// use ml_dataset::SplitRatio;
///
/// let ratio = SplitRatio::try_new(0.8);
/// assert!(ratio.is_ok());
/// assert!(SplitRatio::try_new(1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    train: f32,
}

impl SplitRatio {
    /// Creates a split ratio.
    ///
    /// # Errors
    ///
    /// Returns an error unless `train` is in `(0, 1)`.
    pub fn try_new(train: f32) -> Result<Self> {
        if train > 0.0 && train < 1.0 {
            Ok(Self { train })
        } else {
            Err(DatasetError::invalid_split_ratio(train))
        }
    }

    /// Returns the training ratio.
    #[must_use]
    pub const fn train_ratio(&self) -> f32 {
        self.train
    }

    /// Returns the validation ratio.
    #[must_use]
    pub fn val_ratio(&self) -> f32 {
        1.0 - self.train
    }

    /// Number of training samples out of `total`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split_point(&self, total: usize) -> usize {
        ((total as f32 * self.train).round() as usize).min(total)
    }

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { train: 0.8 };

    /// Common 70/30 split.
    pub const SEVENTY_THIRTY: Self = Self { train: 0.7 };

    /// Common 90/10 split.
    pub const NINETY_TEN: Self = Self { train: 0.9 };
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::EIGHTY_TWENTY
    }
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

/// Splits samples into training and validation sets.
///
/// Without a seed the shuffle draws from entropy.
///
/// # Example
///
/// ```
/// use ml_dataset::{SplitRatio, split_dataset};
///
/// let samples: Vec<u32> = (0..10).collect();
///
/// let (train, val) = split_dataset(&samples, SplitRatio::EIGHTY_TWENTY, Some(42));
/// assert_eq!(train.len(), 8);
/// assert_eq!(val.len(), 2);
/// ```
#[must_use]
pub fn split_dataset<S: Clone>(
    samples: &[S],
    ratio: SplitRatio,
    seed: Option<u64>,
) -> (Vec<S>, Vec<S>) {
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    indices.shuffle(&mut rng_for(seed));

    let split = ratio.split_point(samples.len());
    let train = indices[..split].iter().map(|&i| samples[i].clone()).collect();
    let val = indices[split..].iter().map(|&i| samples[i].clone()).collect();
    (train, val)
}

/// Splits samples so every group keeps its proportion in both sets.
///
/// Groups are formed by `key` (for example the class label) and split
/// independently, then each set is shuffled.
///
/// # Example
///
/// ```
/// use ml_dataset::{SplitRatio, split_stratified};
///
/// let samples: Vec<(u32, &str)> = (0..10)
///     .map(|i| (i, if i < 5 { "cat" } else { "dog" }))
///     .collect();
///
/// let (train, val) = split_stratified(&samples, SplitRatio::EIGHTY_TWENTY, Some(42), |s| s.1);
/// assert_eq!(train.iter().filter(|s| s.1 == "cat").count(), 4);
/// assert_eq!(val.len(), 2);
/// ```
#[must_use]
pub fn split_stratified<S, K, F>(
    samples: &[S],
    ratio: SplitRatio,
    seed: Option<u64>,
    key: F,
) -> (Vec<S>, Vec<S>)
where
    S: Clone,
    K: Eq + Hash,
    F: Fn(&S) -> K,
{
    // Groups in first-appearance order
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<S>> = Vec::new();
    for sample in samples {
        let slot = *slots.entry(key(sample)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(sample.clone());
    }

    let mut train = Vec::with_capacity(samples.len());
    let mut val = Vec::new();
    for (g, group) in groups.iter().enumerate() {
        let group_seed = seed.map(|s| s.wrapping_add(g as u64));
        let (t, v) = split_dataset(group, ratio, group_seed);
        train.extend(t);
        val.extend(v);
    }

    let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, |s| {
        ChaCha8Rng::seed_from_u64(s.wrapping_sub(1))
    });
    train.shuffle(&mut rng);
    val.shuffle(&mut rng);

    (train, val)
}
