//! The transform interface.

use ml_types::{Context, Image};
use rand::Rng;

use crate::error::Result;

/// A context-aware image transformation.
///
/// Implementations are pure functions of the input image, the context and
/// the random numbers drawn from `rng`. Seeding `rng` makes them
/// reproducible.
pub trait Transform {
    /// Applies the transform, allocating the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be transformed.
    fn apply<R: Rng>(&self, image: &Image, context: Context, rng: &mut R) -> Result<Image>;

    /// Applies the transform into a caller-owned buffer.
    ///
    /// The buffer is reshaped as needed. The default implementation
    /// allocates through [`Transform::apply`].
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be transformed.
    fn apply_into<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        *out = self.apply(image, context, rng)?;
        Ok(())
    }
}

/// Two transforms applied in sequence.
impl<A: Transform, B: Transform> Transform for (A, B) {
    fn apply<R: Rng>(&self, image: &Image, context: Context, rng: &mut R) -> Result<Image> {
        let mid = self.0.apply(image, context, rng)?;
        self.1.apply(&mid, context, rng)
    }

    fn apply_into<R: Rng>(
        &self,
        image: &Image,
        context: Context,
        rng: &mut R,
        out: &mut Image,
    ) -> Result<()> {
        let mid = self.0.apply(image, context, rng)?;
        self.1.apply_into(&mid, context, rng, out)
    }
}

/// Runs `transform` on `input` in `context`.
///
/// # Errors
///
/// Propagates the transform's error.
///
/// # Example
///
/// ```
/// use ml_transforms::{ProjectiveTransforms, run};
/// use ml_types::{ColorType, Context, Image};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let resize = ProjectiveTransforms::new(8, 8);
/// let image = Image::filled(20, 12, ColorType::Rgb, 0.5);
///
/// let out = run(&resize, Context::Validation, &image, &mut rng);
/// assert_eq!(out.map(|img| img.dims()).ok(), Some((8, 8, 3)));
/// ```
pub fn run<T: Transform, R: Rng>(
    transform: &T,
    context: Context,
    input: &Image,
    rng: &mut R,
) -> Result<Image> {
    transform.apply(input, context, rng)
}

/// Draws from `[lo, hi)`, returning `lo` for an empty range.
pub(crate) fn uniform<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Returns `true` with probability `p`.
pub(crate) fn chance<R: Rng>(rng: &mut R, p: f32) -> bool {
    rng.gen::<f32>() < p
}
