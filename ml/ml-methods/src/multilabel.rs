//! Multi-label image classification.

use std::fmt::Debug;

use burn::prelude::Backend;
use ml_models::{ConvBackbone, ImageClassifier};
use ml_training::LossFunction;
use ml_types::{Context, Image};
use rand::Rng;

use crate::classes::Classes;
use crate::encoding::ImageEncoding;
use crate::error::{MethodError, Result};
use crate::method::{LearningMethod, MockMethod, check_len, random_image};

/// Tags an image with any subset of a fixed set of classes.
///
/// Targets are multi-hot; a class is predicted when its sigmoid score
/// exceeds `threshold`. Predictions list classes in class order.
///
/// # Example
///
/// ```
/// use ml_methods::{ImageMultiLabel, LearningMethod};
/// use ml_types::Context;
///
/// let method = ImageMultiLabel::new(vec!["indoor", "person", "dog"], 32, 32);
/// let method = method.unwrap_or_else(|e| panic!("{e}"));
///
/// let y = method.encode_target(Context::Training, &vec!["dog", "indoor"]).ok();
/// assert_eq!(y, Some(vec![1.0, 0.0, 1.0]));
///
/// let tags = method.decode_prediction(Context::Inference, &[2.0, -1.0, 0.3]).ok();
/// assert_eq!(tags, Some(vec!["indoor", "dog"]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMultiLabel<C> {
    classes: Classes<C>,
    encoding: ImageEncoding,
    threshold: f32,
}

impl<C: PartialEq + Debug> ImageMultiLabel<C> {
    /// Creates a method encoding to `height x width` with threshold 0.5.
    ///
    /// # Errors
    ///
    /// Returns an error if `classes` is empty or has duplicates, or the size
    /// is zero.
    pub fn new(classes: Vec<C>, height: usize, width: usize) -> Result<Self> {
        Self::with_encoding(classes, ImageEncoding::new(height, width))
    }

    /// Creates a method with a custom encoding pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if `classes` is invalid or the encoding does not
    /// validate.
    pub fn with_encoding(classes: Vec<C>, encoding: ImageEncoding) -> Result<Self> {
        let classes = Classes::new(classes)?;
        encoding.validate()?;
        Ok(Self {
            classes,
            encoding,
            threshold: 0.5,
        })
    }

    /// Sets the decision threshold on sigmoid scores.
    ///
    /// Encoded targets score `sigmoid(0) = 0.5` and `sigmoid(1) ≈ 0.731`,
    /// so only thresholds in `[0.5, sigmoid(1))` decode them back.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0.5 <= threshold < sigmoid(1)`.
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self> {
        let max = sigmoid(1.0);
        if !(0.5..max).contains(&threshold) {
            return Err(MethodError::invalid_config(format!(
                "threshold must be in [0.5, {max}), got {threshold}"
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Class labels in index order.
    #[must_use]
    pub const fn classes(&self) -> &Classes<C> {
        &self.classes
    }

    /// The input encoding pipeline.
    #[must_use]
    pub const fn encoding(&self) -> &ImageEncoding {
        &self.encoding
    }

    /// Decision threshold on sigmoid scores.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl<C: Clone + PartialEq + Debug> LearningMethod for ImageMultiLabel<C> {
    type Input = Image;
    type Target = Vec<C>;

    fn input_dims(&self) -> (usize, usize, usize) {
        self.encoding.input_dims()
    }

    fn num_outputs(&self) -> usize {
        self.classes.len()
    }

    fn buffered(&self) -> bool {
        self.encoding.buffered()
    }

    fn encode_input<R: Rng>(&self, context: Context, input: &Image, rng: &mut R) -> Result<Image> {
        self.encoding.encode(context, input, rng)
    }

    fn encode_input_into<R: Rng>(
        &self,
        context: Context,
        input: &Image,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        self.encoding.encode_into(context, input, rng, out)
    }

    fn encode_target_into(&self, _context: Context, target: &Vec<C>, out: &mut [f32]) -> Result<()> {
        check_len("multi-hot buffer", self.classes.len(), out.len())?;
        let hot = target
            .iter()
            .map(|label| self.classes.require(label))
            .collect::<Result<Vec<_>>>()?;
        out.fill(0.0);
        for i in hot {
            out[i] = 1.0;
        }
        Ok(())
    }

    fn decode_prediction(&self, _context: Context, scores: &[f32]) -> Result<Vec<C>> {
        check_len("scores", self.classes.len(), scores.len())?;
        Ok(self
            .classes
            .iter()
            .zip(scores)
            .filter(|&(_, &score)| sigmoid(score) > self.threshold)
            .map(|(label, _)| label.clone())
            .collect())
    }

    fn build_model<B: Backend>(
        &self,
        backbone: ConvBackbone<B>,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>> {
        let channels = self.encoding.channels();
        if backbone.in_channels() != channels {
            return Err(MethodError::shape_mismatch(
                format!("backbone taking {channels} channels"),
                format!("{} channels", backbone.in_channels()),
            ));
        }
        Ok(ImageClassifier::from_backbone(
            backbone,
            self.classes.len(),
            self.encoding.size(),
            device,
        )?)
    }

    fn loss_function(&self) -> LossFunction {
        LossFunction::BinaryCrossEntropyWithLogits
    }
}

impl<C: Clone + PartialEq + Debug> MockMethod for ImageMultiLabel<C> {
    fn mock_input<R: Rng>(&self, rng: &mut R) -> Image {
        random_image(rng, self.encoding.input_dims())
    }

    /// Each class independently with probability one half.
    fn mock_target<R: Rng>(&self, rng: &mut R) -> Vec<C> {
        self.classes
            .iter()
            .filter(|_| rng.gen_bool(0.5))
            .cloned()
            .collect()
    }
}
