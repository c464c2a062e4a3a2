//! Projective crop, resize and geometric augmentation.

use ml_types::{Context, Image};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::projection::Projection;
use crate::transform::{Transform, chance, uniform};

/// How an input image is fitted into the output size.
///
/// # Example
///
/// ```
/// use ml_transforms::ResizeMode;
///
/// let mode = ResizeMode::default();
/// assert!(matches!(mode, ResizeMode::CropCenter));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResizeMode {
    /// Scale to cover the output, crop the excess.
    #[default]
    CropCenter,

    /// Stretch to the output size (may distort aspect ratio).
    Stretch,

    /// Scale to fit inside the output, pad with black.
    Letterbox,
}

impl ResizeMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CropCenter => "crop_center",
            Self::Stretch => "stretch",
            Self::Letterbox => "letterbox",
        }
    }
}

impl std::fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A random geometric augmentation, applied in training only.
///
/// Each variant fires independently with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectiveAugmentation {
    /// Horizontal flip.
    FlipX {
        /// Application probability.
        p: f32,
    },

    /// Vertical flip.
    FlipY {
        /// Application probability.
        p: f32,
    },

    /// Rotation by an angle drawn from `[-max_degrees, max_degrees)`.
    Rotate {
        /// Maximum absolute angle in degrees.
        max_degrees: f32,
        /// Application probability.
        p: f32,
    },

    /// Zoom by a factor drawn from `[min, max)`. Factors above 1 zoom in.
    Zoom {
        /// Smallest zoom factor.
        min: f32,
        /// Largest zoom factor.
        max: f32,
        /// Application probability.
        p: f32,
    },

    /// Perspective warp: every output corner moves by up to
    /// `magnitude * size` along each axis.
    Perspective {
        /// Corner displacement as a fraction of the output size.
        magnitude: f32,
        /// Application probability.
        p: f32,
    },
}

impl ProjectiveAugmentation {
    /// A typical pipeline for natural images.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::FlipX { p: 0.5 },
            Self::Rotate {
                max_degrees: 10.0,
                p: 0.75,
            },
            Self::Zoom {
                min: 1.0,
                max: 1.1,
                p: 0.75,
            },
            Self::Perspective {
                magnitude: 0.1,
                p: 0.75,
            },
        ]
    }

    /// Application probability.
    #[must_use]
    pub const fn probability(&self) -> f32 {
        match *self {
            Self::FlipX { p }
            | Self::FlipY { p }
            | Self::Rotate { p, .. }
            | Self::Zoom { p, .. }
            | Self::Perspective { p, .. } => p,
        }
    }

    /// Returns the augmentation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FlipX { .. } => "flip_x",
            Self::FlipY { .. } => "flip_y",
            Self::Rotate { .. } => "rotate",
            Self::Zoom { .. } => "zoom",
            Self::Perspective { .. } => "perspective",
        }
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for probabilities outside `[0, 1]` or empty ranges.
    pub fn validate(&self) -> Result<()> {
        let p = self.probability();
        if !(0.0..=1.0).contains(&p) {
            return Err(TransformError::invalid_config(format!(
                "{}: probability {p} outside [0, 1]",
                self.name()
            )));
        }
        let ok = match *self {
            Self::FlipX { .. } | Self::FlipY { .. } => true,
            Self::Rotate { max_degrees, .. } => max_degrees.is_finite() && max_degrees >= 0.0,
            Self::Zoom { min, max, .. } => min > 0.0 && max >= min && max.is_finite(),
            Self::Perspective { magnitude, .. } => (0.0..0.5).contains(&magnitude),
        };
        if ok {
            Ok(())
        } else {
            Err(TransformError::invalid_config(format!(
                "{}: invalid parameters {self:?}",
                self.name()
            )))
        }
    }

    /// Draws the output-space projection for one application.
    ///
    /// Returns `None` when the augmentation does not fire.
    fn sample<R: Rng>(&self, width: f64, height: f64, rng: &mut R) -> Result<Option<Projection>> {
        if !chance(rng, self.probability()) {
            return Ok(None);
        }
        let (cx, cy) = (width / 2.0, height / 2.0);

        let projection = match *self {
            Self::FlipX { .. } => Projection::scaling(-1.0, 1.0).about(cx, cy),
            Self::FlipY { .. } => Projection::scaling(1.0, -1.0).about(cx, cy),
            Self::Rotate { max_degrees, .. } => {
                let max = f64::from(max_degrees).to_radians();
                Projection::rotation(uniform(rng, -max, max)).about(cx, cy)
            }
            Self::Zoom { min, max, .. } => {
                let factor = uniform(rng, f64::from(min), f64::from(max));
                Projection::scaling(1.0 / factor, 1.0 / factor).about(cx, cy)
            }
            Self::Perspective { magnitude, .. } => {
                let (mx, my) = (f64::from(magnitude) * width, f64::from(magnitude) * height);
                let corners = [[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]];
                let mut moved = corners;
                for corner in &mut moved {
                    corner[0] += uniform(rng, -mx, mx);
                    corner[1] += uniform(rng, -my, my);
                }
                Projection::from_corners(corners, moved)?
            }
        };
        Ok(Some(projection))
    }
}

/// Projective transforms: crop/resize to a fixed size plus augmentation.
///
/// All geometry is composed into one [`Projection`] per image, so the input
/// is sampled exactly once. The output always has the configured size,
/// whatever the input size.
///
/// In training a random region covering `crop_scale` of the fitted crop is
/// selected (for [`ResizeMode::CropCenter`]) and augmentations fire.
/// Validation and inference use the deterministic centered fit.
///
/// # Example
///
/// ```
/// use ml_transforms::{ProjectiveAugmentation, ProjectiveTransforms, ResizeMode};
///
/// let transforms = ProjectiveTransforms::new(64, 48)
///     .with_resize_mode(ResizeMode::Letterbox)
///     .with_augmentation(ProjectiveAugmentation::FlipX { p: 0.5 });
///
/// assert_eq!(transforms.size, (64, 48));
/// assert!(transforms.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectiveTransforms {
    /// Output size `(height, width)`.
    pub size: (usize, usize),

    /// How the input is fitted to the output size.
    pub resize_mode: ResizeMode,

    /// Area fraction range of the random training crop. `(1.0, 1.0)`
    /// disables random cropping.
    pub crop_scale: (f32, f32),

    /// Training-time augmentations, applied in order.
    pub augmentations: Vec<ProjectiveAugmentation>,

    /// Reuse output buffers in data loaders.
    pub buffered: bool,
}

impl Default for ProjectiveTransforms {
    fn default() -> Self {
        Self::new(224, 224)
    }
}

impl ProjectiveTransforms {
    /// Creates a transform producing `height x width` images.
    #[must_use]
    pub const fn new(height: usize, width: usize) -> Self {
        Self {
            size: (height, width),
            resize_mode: ResizeMode::CropCenter,
            crop_scale: (1.0, 1.0),
            augmentations: Vec::new(),
            buffered: true,
        }
    }

    /// Sets the resize mode.
    #[must_use]
    pub const fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    /// Sets the random crop area range.
    #[must_use]
    pub const fn with_crop_scale(mut self, min: f32, max: f32) -> Self {
        self.crop_scale = (min, max);
        self
    }

    /// Appends an augmentation.
    #[must_use]
    pub fn with_augmentation(mut self, augmentation: ProjectiveAugmentation) -> Self {
        self.augmentations.push(augmentation);
        self
    }

    /// Replaces the augmentation pipeline.
    #[must_use]
    pub fn with_augmentations(mut self, augmentations: Vec<ProjectiveAugmentation>) -> Self {
        self.augmentations = augmentations;
        self
    }

    /// Sets the buffered flag.
    #[must_use]
    pub const fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    /// Output height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.size.0
    }

    /// Output width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.size.1
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the configuration, describing the first problem found.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero output size, a crop range outside
    /// `(0, 1]`, or an invalid augmentation.
    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(TransformError::invalid_config(format!(
                "output size {:?} must be non-zero",
                self.size
            )));
        }
        let (lo, hi) = self.crop_scale;
        if !(lo > 0.0 && lo <= hi && hi <= 1.0) {
            return Err(TransformError::invalid_config(format!(
                "crop scale ({lo}, {hi}) must satisfy 0 < min <= max <= 1"
            )));
        }
        self.augmentations
            .iter()
            .try_for_each(ProjectiveAugmentation::validate)
    }

    /// Builds the output-to-input projection for one image.
    ///
    /// # Errors
    ///
    /// Returns an error if an augmentation cannot be solved.
    #[allow(clippy::cast_precision_loss)]
    pub fn projection<R: Rng>(
        &self,
        input_width: usize,
        input_height: usize,
        context: Context,
        rng: &mut R,
    ) -> Result<Projection> {
        let (in_w, in_h) = (input_width as f64, input_height as f64);
        let (out_h, out_w) = (self.size.0 as f64, self.size.1 as f64);

        let base = match self.resize_mode {
            ResizeMode::Stretch => Projection::scaling(in_w / out_w, in_h / out_h),
            ResizeMode::Letterbox => {
                let scale = (out_w / in_w).min(out_h / in_h);
                let pad_x = scale.mul_add(-in_w, out_w) / 2.0;
                let pad_y = scale.mul_add(-in_h, out_h) / 2.0;
                Projection::scaling(1.0 / scale, 1.0 / scale)
                    .then(Projection::translation(-pad_x, -pad_y))
            }
            ResizeMode::CropCenter => {
                let scale = (out_w / in_w).max(out_h / in_h);
                let (mut crop_w, mut crop_h) = (out_w / scale, out_h / scale);
                let (mut x0, mut y0) = ((in_w - crop_w) / 2.0, (in_h - crop_h) / 2.0);

                if context.augments() {
                    let (lo, hi) = self.crop_scale;
                    let area = uniform(rng, f64::from(lo), f64::from(hi));
                    crop_w *= area.sqrt();
                    crop_h *= area.sqrt();
                    x0 = uniform(rng, 0.0, in_w - crop_w);
                    y0 = uniform(rng, 0.0, in_h - crop_h);
                }

                Projection::translation(x0, y0)
                    .then(Projection::scaling(crop_w / out_w, crop_h / out_h))
            }
        };

        if !context.augments() {
            return Ok(base);
        }

        let mut projection = base;
        for augmentation in &self.augmentations {
            if let Some(step) = augmentation.sample(out_w, out_h, rng)? {
                projection = projection.then(step);
            }
        }
        Ok(projection)
    }
}

impl Transform for ProjectiveTransforms {
    fn apply<R: Rng>(&self, image: &Image, context: Context, rng: &mut R) -> Result<Image> {
        let mut out = Image::zeros(self.width(), self.height(), image.color());
        self.apply_into(image, context, rng, &mut out)?;
        Ok(out)
    }

    fn apply_into<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        self.validate()?;
        if image.is_empty() {
            return Err(TransformError::invalid_image("image has no pixels"));
        }
        let projection = self.projection(image.width(), image.height(), context, rng)?;
        out.reshape_buffer(self.width(), self.height(), image.color());
        projection.warp(image, out);
        Ok(())
    }
}
