//! Convolutional feature extractor.

use burn::module::Module;
use burn::nn::PaddingConfig2d;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::relu;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Configuration for the convolutional backbone.
///
/// # Example
///
/// ```
/// use ml_models::ConvBackboneConfig;
///
/// let config = ConvBackboneConfig::default().with_in_channels(1);
/// assert_eq!(config.channels, vec![16, 32]);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvBackboneConfig {
    /// Input channels (3 for RGB, 1 for gray).
    pub in_channels: usize,

    /// Output channels of each stage. Every stage halves the resolution.
    pub channels: Vec<usize>,

    /// Square kernel size (odd).
    pub kernel_size: usize,
}

impl Default for ConvBackboneConfig {
    fn default() -> Self {
        Self {
            in_channels: 3,
            channels: vec![16, 32],
            kernel_size: 3,
        }
    }
}

impl ConvBackboneConfig {
    /// Creates a configuration with the given stage widths.
    #[must_use]
    pub fn new(channels: Vec<usize>) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    /// Sets the input channels.
    #[must_use]
    pub fn with_in_channels(mut self, in_channels: usize) -> Self {
        self.in_channels = in_channels;
        self
    }

    /// Sets the kernel size.
    #[must_use]
    pub fn with_kernel_size(mut self, kernel_size: usize) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `true` if there is at least one stage, all widths are
    /// positive, and the kernel size is odd.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.in_channels > 0
            && !self.channels.is_empty()
            && self.channels.iter().all(|&c| c > 0)
            && self.kernel_size % 2 == 1
    }

    /// Builds the backbone.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ConvBackbone<B>> {
        if !self.is_valid() {
            return Err(ModelError::invalid_config(format!("{self:?}")));
        }
        let k = self.kernel_size;
        let pad = k / 2;

        let mut stages = Vec::with_capacity(self.channels.len());
        let mut in_channels = self.in_channels;
        for &out_channels in &self.channels {
            stages.push(
                Conv2dConfig::new([in_channels, out_channels], [k, k])
                    .with_stride([2, 2])
                    .with_padding(PaddingConfig2d::Explicit(pad, pad))
                    .init(device),
            );
            in_channels = out_channels;
        }
        Ok(ConvBackbone { stages })
    }
}

/// A stack of stride-2 convolutions with `ReLU` activations.
///
/// Input `[batch, in_channels, h, w]`, output
/// `[batch, channels.last(), ceil(h / 2^n), ceil(w / 2^n)]`.
#[derive(Debug, Module)]
pub struct ConvBackbone<B: Backend> {
    stages: Vec<Conv2d<B>>,
}

impl<B: Backend> ConvBackbone<B> {
    /// Number of input channels the first stage expects.
    #[must_use]
    pub fn in_channels(&self) -> usize {
        self.stages
            .first()
            .map_or(0, |stage| stage.weight.val().dims()[1])
    }

    /// Number of stages.
    #[must_use]
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Runs the feature extractor.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.stages
            .iter()
            .fold(input, |x, stage| relu(stage.forward(x)))
    }
}
