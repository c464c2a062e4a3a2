//! Loss functions on raw logits.

use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::log_softmax;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingError};

/// A loss over `[batch, num_outputs]` logits.
///
/// Both variants take raw logits and use numerically stable formulations,
/// so models never apply softmax or sigmoid themselves.
///
/// # Example
///
/// ```
/// use ml_training::LossFunction;
///
/// let loss = LossFunction::CrossEntropyWithLogits;
/// let value = loss.compute(&[0.0, 0.0], &[1.0, 0.0], 2).unwrap_or_default();
/// assert!((value - std::f32::consts::LN_2).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LossFunction {
    /// Softmax cross-entropy against one-hot or soft targets.
    #[default]
    CrossEntropyWithLogits,

    /// Per-output sigmoid binary cross-entropy, averaged over every entry.
    BinaryCrossEntropyWithLogits,
}

impl LossFunction {
    /// Short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CrossEntropyWithLogits => "cross_entropy",
            Self::BinaryCrossEntropyWithLogits => "binary_cross_entropy",
        }
    }

    /// Computes the mean loss as a one-element tensor.
    ///
    /// # Arguments
    ///
    /// - `logits`: Model output `[batch, num_outputs]`
    /// - `targets`: Targets of the same shape
    pub fn forward<B: Backend>(self, logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Self::CrossEntropyWithLogits => {
                // -sum(y * log_softmax(x)) per row
                (targets * log_softmax(logits, 1))
                    .sum_dim(1)
                    .mean()
                    .neg()
            }
            Self::BinaryCrossEntropyWithLogits => {
                // max(x, 0) - x * y + log(1 + exp(-|x|))
                let softplus = logits.clone().abs().neg().exp().log1p();
                (logits.clone().clamp_min(0.0) - logits * targets + softplus).mean()
            }
        }
    }

    /// Computes the mean loss on host slices.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length or are not a whole
    /// number of `num_outputs` rows.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(self, logits: &[f32], targets: &[f32], num_outputs: usize) -> Result<f32> {
        if num_outputs == 0 || logits.is_empty() || logits.len() % num_outputs != 0 {
            return Err(TrainingError::loss(format!(
                "{} logits do not form rows of {num_outputs}",
                logits.len()
            )));
        }
        if logits.len() != targets.len() {
            return Err(TrainingError::loss(format!(
                "{} logits but {} targets",
                logits.len(),
                targets.len()
            )));
        }

        let rows = logits.len() / num_outputs;
        let total: f32 = match self {
            Self::CrossEntropyWithLogits => logits
                .chunks_exact(num_outputs)
                .zip(targets.chunks_exact(num_outputs))
                .map(|(x, y)| {
                    let max = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    let log_sum = x.iter().map(|&v| (v - max).exp()).sum::<f32>().ln() + max;
                    -x.iter().zip(y).map(|(&v, &t)| t * (v - log_sum)).sum::<f32>()
                })
                .sum(),
            Self::BinaryCrossEntropyWithLogits => {
                let sum: f32 = logits
                    .iter()
                    .zip(targets)
                    .map(|(&x, &y)| x.max(0.0) - x * y + (-x.abs()).exp().ln_1p())
                    .sum();
                sum / num_outputs as f32
            }
        };
        Ok(total / rows as f32)
    }
}

impl std::fmt::Display for LossFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
