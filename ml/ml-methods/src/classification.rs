//! Single-label image classification.

use std::fmt::Debug;

use burn::prelude::Backend;
use ml_models::{ConvBackbone, ImageClassifier};
use ml_training::{LossFunction, argmax};
use ml_types::{Context, Image};
use rand::Rng;
use tracing::debug;

use crate::classes::Classes;
use crate::encoding::ImageEncoding;
use crate::error::{MethodError, Result};
use crate::method::{LearningMethod, MockMethod, check_len, random_image};

/// Classifies an image into exactly one of a fixed set of classes.
///
/// Targets are one-hot over `classes`; predictions are the class with the
/// highest score. The model is trained with softmax cross-entropy on raw
/// logits.
///
/// # Example
///
/// ```
/// use ml_methods::{ImageClassification, LearningMethod};
/// use ml_types::Context;
///
/// let method = ImageClassification::new(vec!["cat", "dog", "bird"], 64, 64);
/// let method = method.unwrap_or_else(|e| panic!("{e}"));
///
/// let y = method.encode_target(Context::Training, &"dog").ok();
/// assert_eq!(y, Some(vec![0.0, 1.0, 0.0]));
///
/// let label = method.decode_prediction(Context::Inference, &[0.1, 0.7, 0.2]).ok();
/// assert_eq!(label, Some("dog"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageClassification<C> {
    classes: Classes<C>,
    encoding: ImageEncoding,
}

impl<C: PartialEq + Debug> ImageClassification<C> {
    /// Creates a method encoding to `height x width` with default
    /// preprocessing.
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
        Ok(Self { classes, encoding })
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
}

impl<C: Clone + PartialEq + Debug> LearningMethod for ImageClassification<C> {
    type Input = Image;
    type Target = C;

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

    fn encode_target_into(&self, _context: Context, target: &C, out: &mut [f32]) -> Result<()> {
        check_len("one-hot buffer", self.classes.len(), out.len())?;
        let hot = self.classes.require(target)?;
        out.fill(0.0);
        out[hot] = 1.0;
        Ok(())
    }

    fn decode_prediction(&self, _context: Context, scores: &[f32]) -> Result<C> {
        check_len("scores", self.classes.len(), scores.len())?;
        argmax(scores)
            .and_then(|i| self.classes.get(i))
            .cloned()
            .ok_or_else(|| MethodError::invalid_scores("every score is NaN"))
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
        let model =
            ImageClassifier::from_backbone(backbone, self.classes.len(), self.encoding.size(), device)?;
        debug!(
            feature_channels = model.feature_channels(),
            num_classes = model.num_classes(),
            "built classifier"
        );
        Ok(model)
    }

    fn loss_function(&self) -> LossFunction {
        LossFunction::CrossEntropyWithLogits
    }
}

impl<C: Clone + PartialEq + Debug> MockMethod for ImageClassification<C> {
    fn mock_input<R: Rng>(&self, rng: &mut R) -> Image {
        random_image(rng, self.encoding.input_dims())
    }

    fn mock_target<R: Rng>(&self, rng: &mut R) -> C {
        let i = rng.gen_range(0..self.classes.len());
        self.classes.as_slice()[i].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use ml_models::ConvBackboneConfig;
    use ml_transforms::{ImagePreprocessing, ProjectiveTransforms};
    use ml_types::{ColorType, ImageStats};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    type TestBackend = NdArray<f32>;

    fn pets() -> ImageClassification<&'static str> {
        ImageClassification::new(vec!["cat", "dog", "bird"], 16, 16)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn encode_target_one_hot() {
        let method = pets();
        assert_eq!(
            method.encode_target(Context::Training, &"dog"),
            Ok(vec![0.0, 1.0, 0.0])
        );
        assert_eq!(
            method.encode_target(Context::Validation, &"bird"),
            Ok(vec![0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn encode_target_unknown_fails() {
        let result = pets().encode_target(Context::Training, &"fish");
        assert!(matches!(result, Err(MethodError::UnknownClass(_))));
    }

    #[test]
    fn encode_target_into_overwrites() {
        let method = pets();
        let mut buffer = [0.3, 0.9, 5.0];
        assert!(method.encode_target_into(Context::Training, &"cat", &mut buffer).is_ok());
        assert_eq!(buffer, [1.0, 0.0, 0.0]);

        let mut short = [0.0; 2];
        let result = method.encode_target_into(Context::Training, &"cat", &mut short);
        assert!(matches!(result, Err(MethodError::ShapeMismatch { .. })));
    }

    #[test]
    fn failed_encode_target_into_leaves_buffer() {
        let mut buffer = [0.0, 1.0, 0.0];
        assert!(pets()
            .encode_target_into(Context::Training, &"fish", &mut buffer)
            .is_err());
        assert_eq!(buffer, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn decode_prediction_argmax() {
        let method = pets();
        assert_eq!(
            method.decode_prediction(Context::Inference, &[0.1, 0.7, 0.2]),
            Ok("dog")
        );
        // Ties go to the first class
        assert_eq!(
            method.decode_prediction(Context::Inference, &[0.4, 0.4, 0.2]),
            Ok("cat")
        );
        assert_eq!(
            method.decode_prediction(Context::Inference, &[f32::NAN, -3.0, -4.0]),
            Ok("dog")
        );
    }

    #[test]
    fn decode_prediction_rejects_bad_scores() {
        let method = pets();
        assert!(matches!(
            method.decode_prediction(Context::Inference, &[0.1, 0.2]),
            Err(MethodError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            method.decode_prediction(Context::Inference, &[f32::NAN; 3]),
            Err(MethodError::InvalidScores(_))
        ));
    }

    #[test]
    fn encode_input_has_configured_size() {
        let method = pets();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for context in Context::ALL {
            let input = method.mock_input(&mut rng);
            let x = method.encode_input(context, &input, &mut rng);
            assert_eq!(x.map(|x| x.dims()).ok(), Some((16, 16, 3)));
        }
    }

    #[test]
    fn encode_input_is_seeded() {
        let method = pets();
        let image = method.mock_input(&mut ChaCha8Rng::seed_from_u64(0));
        let a = method.encode_input(Context::Training, &image, &mut ChaCha8Rng::seed_from_u64(9));
        let b = method.encode_input(Context::Training, &image, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn constructor_rejects_bad_input() {
        assert!(matches!(
            ImageClassification::<u8>::new(Vec::new(), 8, 8),
            Err(MethodError::EmptyClasses)
        ));
        assert!(matches!(
            ImageClassification::new(vec![1, 1], 8, 8),
            Err(MethodError::DuplicateClass(_))
        ));
        assert!(matches!(
            ImageClassification::new(vec![1, 2], 0, 8),
            Err(MethodError::Transform(_))
        ));
    }

    #[test]
    fn mock_target_is_a_class() {
        let method = pets();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..20 {
            let target = method.mock_target(&mut rng);
            assert!(method.classes().contains(&target));
        }
    }

    #[test]
    fn mock_input_spans_target_size() {
        let method = pets();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            let image = method.mock_input(&mut rng);
            assert!((16..32).contains(&image.height()));
            assert!((16..32).contains(&image.width()));
            assert_eq!(image.color(), ColorType::Rgb);
        }
    }

    #[test]
    fn build_model_sizes_head() {
        let device = <TestBackend as Backend>::Device::default();
        let method = pets();
        let model = ConvBackboneConfig::new(vec![4, 8])
            .init::<TestBackend>(&device)
            .map_err(MethodError::from)
            .and_then(|backbone| method.build_model(backbone, &device));

        assert_eq!(model.map(|m| (m.num_classes(), m.feature_channels())).ok(), Some((3, 8)));
    }

    #[test]
    fn build_model_rejects_channel_mismatch() {
        let device = <TestBackend as Backend>::Device::default();
        let method = ImageClassification::with_encoding(
            vec![0, 1],
            ImageEncoding::new(8, 8).with_preprocessing(
                ImagePreprocessing::new(ImageStats::UNITY).with_color(ColorType::Gray),
            ),
        )
        .unwrap_or_else(|err| panic!("{err}"));

        let model = ConvBackboneConfig::default()
            .init::<TestBackend>(&device)
            .map_err(MethodError::from)
            .and_then(|backbone| method.build_model(backbone, &device));
        assert!(matches!(model, Err(MethodError::ShapeMismatch { .. })));
    }

    #[test]
    fn loss_is_cross_entropy() {
        assert_eq!(pets().loss_function(), LossFunction::CrossEntropyWithLogits);
    }

    #[test]
    fn unbuffered_encoding_reported() {
        let method = ImageClassification::with_encoding(
            vec!['a', 'b'],
            ImageEncoding::new(4, 4)
                .with_projective(ProjectiveTransforms::new(4, 4).with_buffered(false)),
        )
        .unwrap_or_else(|err| panic!("{err}"));
        assert!(!method.buffered());
        assert!(pets().buffered());
    }
}
