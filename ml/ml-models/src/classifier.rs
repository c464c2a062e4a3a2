//! Image classifier: backbone plus pooled linear head.

use burn::module::Module;
use burn::nn;
use burn::prelude::Backend;
use burn::tensor::Tensor;

use crate::backbone::ConvBackbone;
use crate::error::{ModelError, Result};

/// Global average pooling followed by a linear layer.
///
/// Maps features `[batch, channels, h, w]` to logits `[batch, num_classes]`.
#[derive(Debug, Module)]
pub struct ClassificationHead<B: Backend> {
    linear: nn::Linear<B>,
}

impl<B: Backend> ClassificationHead<B> {
    /// Creates a head for `channels` input features.
    #[must_use]
    pub fn new(channels: usize, num_classes: usize, device: &B::Device) -> Self {
        let linear = nn::LinearConfig::new(channels, num_classes).init(device);
        Self { linear }
    }

    /// Input feature channels.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.linear.weight.val().dims()[0]
    }

    /// Number of output classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.linear.weight.val().dims()[1]
    }

    /// Pools and projects features to logits.
    pub fn forward(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, channels, _, _] = features.dims();
        let pooled = features.mean_dim(3).mean_dim(2).reshape([batch, channels]);
        self.linear.forward(pooled)
    }
}

/// A backbone with a classification head attached.
///
/// # Type Parameters
///
/// - `B`: The Burn backend (e.g., `NdArray`, `Autodiff<NdArray>`)
///
/// # Example
///
/// ```ignore
/// use ml_models::{ConvBackboneConfig, ImageClassifier};
///
/// let device = Default::default();
/// let backbone = ConvBackboneConfig::default().init::<MyBackend>(&device)?;
/// let model = ImageClassifier::from_backbone(backbone, 10, (32, 32), &device)?;
///
/// let logits = model.forward(Tensor::zeros([4, 3, 32, 32], &device));
/// assert_eq!(logits.dims(), [4, 10]);
/// ```
#[derive(Debug, Module)]
pub struct ImageClassifier<B: Backend> {
    backbone: ConvBackbone<B>,
    head: ClassificationHead<B>,
}

impl<B: Backend> ImageClassifier<B> {
    /// Attaches a head sized for `backbone`'s output.
    ///
    /// The feature width is found by running a single zero image of size
    /// `input_size = (height, width)` through the backbone.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_classes` or the input size is zero, or the
    /// backbone produces an empty feature map.
    pub fn from_backbone(
        backbone: ConvBackbone<B>,
        num_classes: usize,
        input_size: (usize, usize),
        device: &B::Device,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(ModelError::invalid_config("num_classes must be > 0"));
        }
        let (height, width) = input_size;
        if height == 0 || width == 0 {
            return Err(ModelError::invalid_config(format!(
                "input size {input_size:?} must be non-zero"
            )));
        }
        let in_channels = backbone.in_channels();
        if in_channels == 0 {
            return Err(ModelError::invalid_config("backbone has no stages"));
        }

        let probe = Tensor::<B, 4>::zeros([1, in_channels, height, width], device);
        let dims = backbone.forward(probe).dims();
        if dims.contains(&0) {
            return Err(ModelError::shape_mismatch(
                "non-empty [1, channels, h, w] features",
                format!("{dims:?}"),
            ));
        }

        let head = ClassificationHead::new(dims[1], num_classes, device);
        Ok(Self { backbone, head })
    }

    /// Input channels expected by the backbone.
    #[must_use]
    pub fn in_channels(&self) -> usize {
        self.backbone.in_channels()
    }

    /// Number of output classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.head.num_classes()
    }

    /// Feature width seen by the head.
    #[must_use]
    pub fn feature_channels(&self) -> usize {
        self.head.in_features()
    }

    /// Runs the forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: Image tensor of shape `[batch, channels, height, width]`
    ///
    /// # Returns
    ///
    /// Logits of shape `[batch, num_classes]` (not probabilities)
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.head.forward(self.backbone.forward(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backbone::ConvBackboneConfig;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn backbone(in_channels: usize) -> Option<ConvBackbone<TestBackend>> {
        let device = <TestBackend as Backend>::Device::default();
        ConvBackboneConfig::new(vec![4, 6])
            .with_in_channels(in_channels)
            .init(&device)
            .ok()
    }

    #[test]
    fn head_pools_and_projects() {
        let device = <TestBackend as Backend>::Device::default();
        let head = ClassificationHead::<TestBackend>::new(5, 3, &device);

        let features = Tensor::<TestBackend, 4>::ones([2, 5, 4, 4], &device);
        assert_eq!(head.forward(features).dims(), [2, 3]);
        assert_eq!(head.in_features(), 5);
        assert_eq!(head.num_classes(), 3);
    }

    #[test]
    fn from_backbone_infers_channels() {
        let device = <TestBackend as Backend>::Device::default();
        let model = backbone(3)
            .and_then(|b| ImageClassifier::from_backbone(b, 7, (16, 16), &device).ok());
        assert!(model.is_some());

        if let Some(model) = model {
            assert_eq!(model.feature_channels(), 6);
            assert_eq!(model.num_classes(), 7);
            assert_eq!(model.in_channels(), 3);

            let input = Tensor::<TestBackend, 4>::zeros([3, 3, 16, 16], &device);
            assert_eq!(model.forward(input).dims(), [3, 7]);
        }
    }

    #[test]
    fn from_backbone_accepts_other_input_sizes() {
        let device = <TestBackend as Backend>::Device::default();
        let model = backbone(1)
            .and_then(|b| ImageClassifier::from_backbone(b, 2, (9, 31), &device).ok());

        if let Some(model) = model {
            // Pooling makes the head independent of spatial size.
            let input = Tensor::<TestBackend, 4>::zeros([1, 1, 20, 20], &device);
            assert_eq!(model.forward(input).dims(), [1, 2]);
        } else {
            panic!("model construction failed");
        }
    }

    #[test]
    fn from_backbone_rejects_zero_classes() {
        let device = <TestBackend as Backend>::Device::default();
        let result = backbone(3).map(|b| ImageClassifier::from_backbone(b, 0, (8, 8), &device));
        assert!(matches!(result, Some(Err(ModelError::InvalidConfig(_)))));
    }

    #[test]
    fn from_backbone_rejects_zero_size() {
        let device = <TestBackend as Backend>::Device::default();
        let result = backbone(3).map(|b| ImageClassifier::from_backbone(b, 2, (0, 8), &device));
        assert!(matches!(result, Some(Err(ModelError::InvalidConfig(_)))));
    }
}
