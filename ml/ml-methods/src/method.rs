//! The learning method interface.

use burn::prelude::Backend;
use ml_dataset::LabeledSample;
use ml_models::{ConvBackbone, ImageClassifier};
use ml_training::LossFunction;
use ml_types::{Context, Image};
use rand::Rng;

use crate::error::Result;
use crate::mock::MockClassifier;

/// How raw samples become model inputs and targets, and how model outputs
/// become predictions.
///
/// A method is immutable after construction. All scratch state lives in
/// caller-owned buffers passed to the `_into` variants, so one method can be
/// shared by any number of loaders.
pub trait LearningMethod {
    /// Raw input type.
    type Input;

    /// Label type, also the decoded prediction type.
    type Target;

    /// Encoded input `(height, width, channels)`.
    fn input_dims(&self) -> (usize, usize, usize);

    /// Length of encoded targets and model outputs.
    fn num_outputs(&self) -> usize;

    /// Whether loaders should reuse an input buffer across samples.
    fn buffered(&self) -> bool;

    /// Encodes an input for `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be encoded.
    fn encode_input<R: Rng>(
        &self,
        context: Context,
        input: &Self::Input,
        rng: &mut R,
    ) -> Result<Image>;

    /// Encodes an input into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be encoded.
    fn encode_input_into<R: Rng>(
        &self,
        context: Context,
        input: &Self::Input,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        *out = self.encode_input(context, input, rng)?;
        Ok(())
    }

    /// Encodes a target into `out`, overwriting every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not representable or `out` has
    /// the wrong length.
    fn encode_target_into(
        &self,
        context: Context,
        target: &Self::Target,
        out: &mut [f32],
    ) -> Result<()>;

    /// Encodes a target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not representable.
    fn encode_target(&self, context: Context, target: &Self::Target) -> Result<Vec<f32>> {
        let mut out = vec![0.0; self.num_outputs()];
        self.encode_target_into(context, target, &mut out)?;
        Ok(out)
    }

    /// Decodes one sample's model output.
    ///
    /// # Errors
    ///
    /// Returns an error if `scores` has the wrong length or cannot be
    /// decoded.
    fn decode_prediction(&self, context: Context, scores: &[f32]) -> Result<Self::Target>;

    /// Attaches a head sized for this method to `backbone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backbone does not fit the encoded inputs.
    fn build_model<B: Backend>(
        &self,
        backbone: ConvBackbone<B>,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>>;

    /// Loss to train the model with.
    fn loss_function(&self) -> LossFunction;
}

/// Random samples and models for exercising a method without data.
pub trait MockMethod: LearningMethod {
    /// A random raw input the method can encode.
    fn mock_input<R: Rng>(&self, rng: &mut R) -> Self::Input;

    /// A random valid target.
    fn mock_target<R: Rng>(&self, rng: &mut R) -> Self::Target;

    /// A random `(input, target)` sample.
    fn mock_sample<R: Rng>(&self, rng: &mut R) -> LabeledSample<Self::Input, Self::Target> {
        let input = self.mock_input(rng);
        LabeledSample::new(input, self.mock_target(rng))
    }

    /// A model stand-in producing scores of the right length.
    fn mock_model(&self) -> MockClassifier {
        MockClassifier::new(self.num_outputs())
    }
}

/// A random RGB or gray image, each side in `[side, 2 * side)`.
pub(crate) fn random_image<R: Rng>(
    rng: &mut R,
    (height, width, channels): (usize, usize, usize),
) -> Image {
    let h = rng.gen_range(height.max(1)..2 * height.max(1));
    let w = rng.gen_range(width.max(1)..2 * width.max(1));
    let color = if channels == 1 {
        ml_types::ColorType::Gray
    } else {
        ml_types::ColorType::Rgb
    };
    let mut image = Image::zeros(w, h, color);
    image
        .data_mut()
        .iter_mut()
        .for_each(|v| *v = rng.gen::<f32>());
    image
}

/// Checks that `out` holds exactly `expected` values.
pub(crate) fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(crate::error::MethodError::shape_mismatch(
            format!("{what} of length {expected}"),
            format!("length {actual}"),
        ))
    }
}
