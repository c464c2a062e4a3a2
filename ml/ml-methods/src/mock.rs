//! Model stand-in for method tests.

use ml_types::Image;
use rand::Rng;

/// Produces random logits of a fixed length, ignoring its input.
///
/// # Example
///
/// ```
/// use ml_methods::MockClassifier;
/// use ml_types::{ColorType, Image};
/// use rand::SeedableRng;
///
/// let model = MockClassifier::new(3);
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
/// let scores = model.forward(&Image::zeros(4, 4, ColorType::Rgb), &mut rng);
/// assert_eq!(scores.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockClassifier {
    num_outputs: usize,
}

impl MockClassifier {
    /// Creates a mock with `num_outputs` logits per sample.
    #[must_use]
    pub const fn new(num_outputs: usize) -> Self {
        Self { num_outputs }
    }

    /// Logits per sample.
    #[must_use]
    pub const fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Logits in `[-1, 1)` for one encoded image.
    pub fn forward<R: Rng>(&self, _input: &Image, rng: &mut R) -> Vec<f32> {
        (0..self.num_outputs)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect()
    }
}
