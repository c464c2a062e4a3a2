//! Labeled sample type.

use serde::{Deserialize, Serialize};

/// A single `(input, target)` pair.
///
/// # Example
///
/// ```
/// use ml_dataset::LabeledSample;
///
/// let sample = LabeledSample::new(vec![0.5_f32; 4], "cat");
/// assert_eq!(sample.target, "cat");
///
/// let (input, target) = sample.into_parts();
/// assert_eq!(input.len(), 4);
/// assert_eq!(target, "cat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledSample<I, T> {
    /// Raw input.
    pub input: I,

    /// Raw target.
    pub target: T,
}

impl<I, T> LabeledSample<I, T> {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(input: I, target: T) -> Self {
        Self { input, target }
    }

    /// Splits the sample into its input and target.
    #[must_use]
    pub fn into_parts(self) -> (I, T) {
        (self.input, self.target)
    }

    /// Maps the target, keeping the input.
    #[must_use]
    pub fn map_target<U>(self, f: impl FnOnce(T) -> U) -> LabeledSample<I, U> {
        LabeledSample {
            input: self.input,
            target: f(self.target),
        }
    }
}

impl<I, T> From<(I, T)> for LabeledSample<I, T> {
    fn from((input, target): (I, T)) -> Self {
        Self::new(input, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_from_tuple() {
        let sample: LabeledSample<u32, &str> = (7, "dog").into();
        assert_eq!(sample.input, 7);
        assert_eq!(sample.target, "dog");
    }

    #[test]
    fn sample_map_target() {
        let sample = LabeledSample::new(1u8, "bird").map_target(str::len);
        assert_eq!(sample.target, 4);
        assert_eq!(sample.input, 1);
    }

    #[test]
    fn sample_serialization() {
        let sample = LabeledSample::new(vec![1.0_f32, 2.0], String::from("cat"));
        let json = serde_json::to_string(&sample);
        assert!(json.is_ok());

        let parsed: std::result::Result<LabeledSample<Vec<f32>, String>, _> =
            serde_json::from_str(&json.unwrap_or_default());
        assert_eq!(parsed.ok(), Some(sample));
    }
}
