//! Image statistics for preprocessing.

use serde::{Deserialize, Serialize};

use crate::error::{MlTypesError, Result};
use crate::image::Image;

/// Per-channel normalization statistics.
///
/// Gray images use channel 0.
///
/// # Example
///
/// ```
/// use ml_types::ImageStats;
///
/// let stats = ImageStats::new([0.485, 0.456, 0.406], [0.229, 0.224, 0.225]);
///
/// // Normalize a pixel value (channel 0)
/// let raw = 128.0 / 255.0;
/// let normalized = stats.normalize(raw, 0);
/// assert!((normalized - (raw - 0.485) / 0.229).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    /// Per-channel mean values (typically `[0, 1]`).
    pub mean: [f32; 3],

    /// Per-channel standard deviation values.
    pub std: [f32; 3],
}

impl ImageStats {
    /// Creates new image statistics.
    #[must_use]
    pub const fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        Self { mean, std }
    }

    /// `ImageNet` normalization statistics.
    ///
    /// Standard values used for pretrained models.
    pub const IMAGENET: Self = Self {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    /// Unity normalization (no normalization).
    ///
    /// Mean 0, std 1 - leaves values unchanged.
    pub const UNITY: Self = Self {
        mean: [0.0, 0.0, 0.0],
        std: [1.0, 1.0, 1.0],
    };

    /// Creates statistics for zero-centered normalization.
    ///
    /// Scales to `[-1, 1]` range from `[0, 1]`.
    pub const ZERO_CENTERED: Self = Self {
        mean: [0.5, 0.5, 0.5],
        std: [0.5, 0.5, 0.5],
    };

    /// Estimates statistics from a collection of images.
    ///
    /// Gray images contribute to all three channels.
    ///
    /// # Errors
    ///
    /// Returns an error if `images` is empty or a channel has zero variance.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn fit(images: &[Image]) -> Result<Self> {
        let mut sum = [0.0f64; 3];
        let mut sum_sq = [0.0f64; 3];
        let mut count = [0usize; 3];

        for image in images {
            let channels = image.channels();
            for pixel in image.data().chunks_exact(channels) {
                for c in 0..3 {
                    let value = f64::from(pixel[c.min(channels - 1)]);
                    sum[c] += value;
                    sum_sq[c] += value * value;
                    count[c] += 1;
                }
            }
        }

        if count[0] == 0 {
            return Err(MlTypesError::invalid_stats("no pixels to fit"));
        }

        let mut mean = [0.0f32; 3];
        let mut std = [0.0f32; 3];
        for c in 0..3 {
            let n = count[c] as f64;
            let m = sum[c] / n;
            let var = (sum_sq[c] / n - m * m).max(0.0);
            mean[c] = m as f32;
            std[c] = var.sqrt() as f32;
        }

        let stats = Self { mean, std };
        stats.validate()?;
        Ok(stats)
    }

    /// Normalizes a single value.
    #[must_use]
    pub fn normalize(&self, value: f32, channel: usize) -> f32 {
        if channel >= 3 {
            return value;
        }
        (value - self.mean[channel]) / self.std[channel]
    }

    /// Denormalizes a single value.
    #[must_use]
    pub fn denormalize(&self, value: f32, channel: usize) -> f32 {
        if channel >= 3 {
            return value;
        }
        value.mul_add(self.std[channel], self.mean[channel])
    }

    /// Normalizes an RGB pixel.
    #[must_use]
    pub fn normalize_pixel(&self, rgb: [f32; 3]) -> [f32; 3] {
        [
            (rgb[0] - self.mean[0]) / self.std[0],
            (rgb[1] - self.mean[1]) / self.std[1],
            (rgb[2] - self.mean[2]) / self.std[2],
        ]
    }

    /// Normalizes every value of an image in place.
    pub fn normalize_image(&self, image: &mut Image) {
        let channels = image.channels();
        for pixel in image.data_mut().chunks_exact_mut(channels) {
            for (c, value) in pixel.iter_mut().enumerate() {
                *value = self.normalize(*value, c);
            }
        }
    }

    /// Validates the statistics.
    ///
    /// Returns `false` if std contains zeros or `NaN` values.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.std.iter().all(|&s| s.is_finite() && s.abs() > 1e-10)
            && self.mean.iter().all(|m| m.is_finite())
    }

    /// Validates the statistics, describing the first problem found.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Self::is_valid`] would return `false`.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MlTypesError::invalid_stats(format!(
                "mean {:?}, std {:?}: std must be finite and non-zero",
                self.mean, self.std
            )))
        }
    }
}

impl Default for ImageStats {
    fn default() -> Self {
        Self::IMAGENET
    }
}
