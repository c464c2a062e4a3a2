//! Color conversion, photometric augmentation and normalization.

use ml_types::{ColorType, Context, Image, ImageStats};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::transform::{Transform, chance, uniform};

/// A random photometric augmentation, applied in training only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhotometricAugmentation {
    /// Adds an offset drawn from `[-max_delta, max_delta)` to every value.
    Brightness {
        /// Largest absolute offset.
        max_delta: f32,
        /// Application probability.
        p: f32,
    },

    /// Scales values about 0.5 by a factor drawn from
    /// `[1 / max_factor, max_factor)`.
    Contrast {
        /// Largest factor, at least 1.
        max_factor: f32,
        /// Application probability.
        p: f32,
    },

    /// Adds independent Gaussian noise to every value.
    Noise {
        /// Noise standard deviation.
        std: f32,
        /// Application probability.
        p: f32,
    },
}

impl PhotometricAugmentation {
    /// Application probability.
    #[must_use]
    pub const fn probability(&self) -> f32 {
        match *self {
            Self::Brightness { p, .. } | Self::Contrast { p, .. } | Self::Noise { p, .. } => p,
        }
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for probabilities outside `[0, 1]` or negative
    /// magnitudes.
    pub fn validate(&self) -> Result<()> {
        let valid_p = (0.0..=1.0).contains(&self.probability());
        let valid = match *self {
            Self::Brightness { max_delta, .. } => max_delta.is_finite() && max_delta >= 0.0,
            Self::Contrast { max_factor, .. } => max_factor.is_finite() && max_factor >= 1.0,
            Self::Noise { std, .. } => std.is_finite() && std >= 0.0,
        };
        if valid_p && valid {
            Ok(())
        } else {
            Err(TransformError::invalid_config(format!(
                "invalid photometric augmentation {self:?}"
            )))
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply<R: Rng>(&self, data: &mut [f32], rng: &mut R) {
        if !chance(rng, self.probability()) {
            return;
        }
        match *self {
            Self::Brightness { max_delta, .. } => {
                let max = f64::from(max_delta);
                let delta = uniform(rng, -max, max) as f32;
                data.iter_mut().for_each(|v| *v += delta);
            }
            Self::Contrast { max_factor, .. } => {
                let max = f64::from(max_factor);
                let factor = uniform(rng, 1.0 / max, max) as f32;
                data.iter_mut()
                    .for_each(|v| *v = (*v - 0.5).mul_add(factor, 0.5));
            }
            Self::Noise { std, .. } => {
                for v in data.iter_mut() {
                    *v += std * rng.sample::<f32, _>(StandardNormal);
                }
            }
        }
    }
}

/// Image preprocessing: color conversion, photometric augmentation and
/// per-channel normalization `(x - mean) / std`.
///
/// # Example
///
/// ```
/// use ml_transforms::{ImagePreprocessing, Transform};
/// use ml_types::{ColorType, Context, Image, ImageStats};
/// use rand::SeedableRng;
///
/// let prep = ImagePreprocessing::new(ImageStats::ZERO_CENTERED);
/// let image = Image::filled(2, 2, ColorType::Gray, 1.0);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
///
/// let out = prep.apply(&image, Context::Inference, &mut rng).ok();
/// let out = out.map(|img| (img.channels(), img.data()[0]));
/// assert_eq!(out, Some((3, 1.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePreprocessing {
    /// Normalization statistics.
    pub stats: ImageStats,

    /// Output color type.
    pub color: ColorType,

    /// Training-time photometric augmentations, applied in order.
    pub augmentations: Vec<PhotometricAugmentation>,
}

impl Default for ImagePreprocessing {
    fn default() -> Self {
        Self::new(ImageStats::IMAGENET)
    }
}

impl ImagePreprocessing {
    /// Creates RGB preprocessing with the given statistics.
    #[must_use]
    pub const fn new(stats: ImageStats) -> Self {
        Self {
            stats,
            color: ColorType::Rgb,
            augmentations: Vec::new(),
        }
    }

    /// Sets the output color type.
    #[must_use]
    pub const fn with_color(mut self, color: ColorType) -> Self {
        self.color = color;
        self
    }

    /// Appends an augmentation.
    #[must_use]
    pub fn with_augmentation(mut self, augmentation: PhotometricAugmentation) -> Self {
        self.augmentations.push(augmentation);
        self
    }

    /// Number of output channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.color.channels()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid statistics or augmentations.
    pub fn validate(&self) -> Result<()> {
        self.stats
            .validate()
            .map_err(|err| TransformError::invalid_config(err.to_string()))?;
        self.augmentations
            .iter()
            .try_for_each(PhotometricAugmentation::validate)
    }

    /// Preprocesses `image` in place.
    ///
    /// The buffer is only reallocated when the color type changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn apply_in_place<R: Rng>(
        &self,
        image: &mut Image,
        context: Context,
        rng: &mut R,
    ) -> Result<()> {
        self.validate()?;
        if image.color() != self.color {
            *image = image.to_color(self.color);
        }
        if context.augments() && !self.augmentations.is_empty() {
            for augmentation in &self.augmentations {
                augmentation.apply(image.data_mut(), rng);
            }
            image.data_mut().iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0));
        }
        self.stats.normalize_image(image);
        Ok(())
    }
}

impl Transform for ImagePreprocessing {
    fn apply<R: Rng>(&self, image: &Image, context: Context, rng: &mut R) -> Result<Image> {
        let mut out = image.clone();
        self.apply_in_place(&mut out, context, rng)?;
        Ok(out)
    }

    fn apply_into<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        out.reshape_buffer(image.width(), image.height(), image.color());
        out.data_mut().copy_from_slice(image.data());
        self.apply_in_place(out, context, rng)
    }
}
