//! Shared image encoding pipeline.

use ml_transforms::{ImagePreprocessing, ProjectiveTransforms, Transform};
use ml_types::{Context, Image};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Projective resize/augmentation followed by color conversion,
/// photometric augmentation, and normalization.
///
/// Output images always have `(height, width, channels)` equal to
/// [`ImageEncoding::input_dims`], whatever the input size.
///
/// # Example
///
/// ```
/// use ml_methods::ImageEncoding;
/// use ml_types::{ColorType, Context, Image};
/// use rand::SeedableRng;
///
/// let encoding = ImageEncoding::new(32, 48);
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
///
/// let image = Image::filled(100, 60, ColorType::Rgb, 0.5);
/// let x = encoding.encode(Context::Validation, &image, &mut rng).ok();
/// assert_eq!(x.map(|x| x.dims()), Some((32, 48, 3)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageEncoding {
    /// Geometry: output size, resize mode, augmentations.
    pub projective: ProjectiveTransforms,

    /// Color, photometric augmentations, and normalization.
    pub preprocessing: ImagePreprocessing,
}

impl ImageEncoding {
    /// Creates an encoding to `height x width` RGB with `ImageNet` statistics.
    #[must_use]
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            projective: ProjectiveTransforms::new(height, width),
            preprocessing: ImagePreprocessing::default(),
        }
    }

    /// Replaces the projective stage.
    #[must_use]
    pub fn with_projective(mut self, projective: ProjectiveTransforms) -> Self {
        self.projective = projective;
        self
    }

    /// Replaces the preprocessing stage.
    #[must_use]
    pub fn with_preprocessing(mut self, preprocessing: ImagePreprocessing) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// Output `(height, width)`.
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        self.projective.size
    }

    /// Output channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.preprocessing.channels()
    }

    /// Output `(height, width, channels)`.
    #[must_use]
    pub const fn input_dims(&self) -> (usize, usize, usize) {
        let (h, w) = self.projective.size;
        (h, w, self.preprocessing.channels())
    }

    /// Whether loaders should reuse output buffers.
    #[must_use]
    pub const fn buffered(&self) -> bool {
        self.projective.buffered
    }

    /// Validates both stages.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        self.projective.validate()?;
        self.preprocessing.validate()?;
        Ok(())
    }

    /// Encodes `image`, allocating the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the image is empty.
    pub fn encode<R: Rng>(&self, context: Context, image: &Image, rng: &mut R) -> Result<Image> {
        let mut out = self.projective.apply(image, context, rng)?;
        self.preprocessing.apply_in_place(&mut out, context, rng)?;
        Ok(out)
    }

    /// Encodes `image` into `out`, reusing its allocation when the color
    /// type already matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the image is empty.
    pub fn encode_into<R: Rng>(
        &self,
        context: Context,
        image: &Image,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        self.projective.apply_into(image, context, rng, out)?;
        self.preprocessing.apply_in_place(out, context, rng)?;
        Ok(())
    }
}

impl Transform for ImageEncoding {
    fn apply<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
    ) -> ml_transforms::Result<Image> {
        let mut out = self.projective.apply(image, context, rng)?;
        self.preprocessing.apply_in_place(&mut out, context, rng)?;
        Ok(out)
    }

    fn apply_into<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
        out: &mut Image,
    ) -> ml_transforms::Result<()> {
        self.projective.apply_into(image, context, rng, out)?;
        self.preprocessing.apply_in_place(out, context, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ml_transforms::{ProjectiveAugmentation, run};
    use ml_types::{ColorType, ImageStats};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn dims_follow_config() {
        let encoding = ImageEncoding::new(10, 20);
        assert_eq!(encoding.size(), (10, 20));
        assert_eq!(encoding.input_dims(), (10, 20, 3));
        assert!(encoding.buffered());
        assert!(encoding.validate().is_ok());
    }

    #[test]
    fn normalizes_constant_image() {
        let encoding = ImageEncoding::new(4, 4)
            .with_preprocessing(ImagePreprocessing::new(ImageStats::ZERO_CENTERED));
        let image = Image::filled(9, 7, ColorType::Rgb, 1.0);

        let x = encoding
            .encode(Context::Inference, &image, &mut rng(0))
            .unwrap_or_else(|e| panic!("{e}"));
        // (1 - 0.5) / 0.5
        assert!(x.data().iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn gray_input_becomes_rgb() {
        let encoding = ImageEncoding::new(6, 6);
        let image = Image::filled(12, 12, ColorType::Gray, 0.3);
        let x = encoding.encode(Context::Validation, &image, &mut rng(1));
        assert_eq!(x.map(|x| x.dims()).ok(), Some((6, 6, 3)));
    }

    #[test]
    fn encode_into_matches_encode() {
        let encoding = ImageEncoding::new(8, 8).with_projective(
            ProjectiveTransforms::new(8, 8).with_augmentations(ProjectiveAugmentation::defaults()),
        );
        let image = Image::filled(30, 20, ColorType::Rgb, 0.6);

        let expected = encoding
            .encode(Context::Training, &image, &mut rng(5))
            .unwrap_or_else(|e| panic!("{e}"));
        let mut out = Image::zeros(1, 1, ColorType::Rgb);
        assert!(encoding
            .encode_into(Context::Training, &image, &mut rng(5), &mut out)
            .is_ok());
        assert_eq!(out, expected);
    }

    #[test]
    fn transform_impl_matches_encode() {
        let encoding = ImageEncoding::new(5, 5);
        let image = Image::filled(10, 10, ColorType::Rgb, 0.25);

        let via_run = run(&encoding, Context::Inference, &image, &mut rng(0))
            .unwrap_or_else(|e| panic!("{e}"));
        let direct = encoding
            .encode(Context::Inference, &image, &mut rng(0))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(via_run, direct);
        assert_relative_eq!(
            direct.get(2, 2, 0),
            ImageStats::IMAGENET.normalize(0.25, 0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn serialization() {
        let encoding = ImageEncoding::new(16, 16);
        let json = serde_json::to_string(&encoding).unwrap_or_default();
        let parsed: Option<ImageEncoding> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(encoding));
    }
}
