//! Collated batches of encoded samples.

use ml_types::Image;

use crate::error::{DatasetError, Result};

/// A batch of encoded inputs and targets in flat row-major storage.
///
/// `inputs` holds `input_shape = [n, height, width, channels]` values (each
/// sample HWC, samples concatenated); `targets` holds `n * num_outputs`
/// values.
///
/// # Example
///
/// ```
/// use ml_dataset::Batch;
/// use ml_types::{ColorType, Image};
///
/// let inputs = vec![Image::zeros(4, 2, ColorType::Rgb); 3];
/// let targets = vec![vec![1.0, 0.0]; 3];
///
/// let batch = Batch::collate(&inputs, &targets);
/// let batch = batch.ok();
/// assert_eq!(batch.as_ref().map(|b| b.input_shape), Some([3, 2, 4, 3]));
/// assert_eq!(batch.as_ref().map(Batch::len), Some(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// Flat NHWC input data.
    pub inputs: Vec<f32>,

    /// `[n, height, width, channels]`.
    pub input_shape: [usize; 4],

    /// Flat `[n, num_outputs]` target data.
    pub targets: Vec<f32>,

    /// Target length per sample.
    pub num_outputs: usize,
}

impl Batch {
    /// Creates an empty batch for samples of the given shape.
    #[must_use]
    pub fn with_shape(dims: (usize, usize, usize), num_outputs: usize, capacity: usize) -> Self {
        let (h, w, c) = dims;
        Self {
            inputs: Vec::with_capacity(capacity * h * w * c),
            input_shape: [0, h, w, c],
            targets: Vec::with_capacity(capacity * num_outputs),
            num_outputs,
        }
    }

    /// Collates encoded samples into a batch.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples, the counts differ, or any
    /// input or target shape disagrees with the first sample.
    pub fn collate<T: AsRef<[f32]>>(inputs: &[Image], targets: &[T]) -> Result<Self> {
        let (first, first_target) = match (inputs.first(), targets.first()) {
            (Some(x), Some(y)) => (x, y.as_ref()),
            _ => return Err(DatasetError::EmptyBatch),
        };
        if inputs.len() != targets.len() {
            return Err(DatasetError::shape_mismatch(
                format!("{} targets", inputs.len()),
                format!("{} targets", targets.len()),
            ));
        }

        let mut batch = Self::with_shape(first.dims(), first_target.len(), inputs.len());
        for (x, y) in inputs.iter().zip(targets) {
            batch.push(x, y.as_ref())?;
        }
        Ok(batch)
    }

    /// Appends one sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample shape disagrees with the batch.
    pub fn push(&mut self, input: &Image, target: &[f32]) -> Result<()> {
        let [_, h, w, c] = self.input_shape;
        if input.dims() != (h, w, c) {
            return Err(DatasetError::shape_mismatch(
                format!("{:?}", (h, w, c)),
                format!("{:?}", input.dims()),
            ));
        }
        if target.len() != self.num_outputs {
            return Err(DatasetError::shape_mismatch(
                format!("target of length {}", self.num_outputs),
                format!("length {}", target.len()),
            ));
        }
        self.inputs.extend_from_slice(input.data());
        self.targets.extend_from_slice(target);
        self.input_shape[0] += 1;
        Ok(())
    }

    /// Removes every sample, keeping the allocations and the shape.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.targets.clear();
        self.input_shape[0] = 0;
    }

    /// Number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.input_shape[0]
    }

    /// Returns `true` if the batch holds no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.input_shape[0] == 0
    }

    /// Per-sample `(height, width, channels)`.
    #[must_use]
    pub const fn sample_dims(&self) -> (usize, usize, usize) {
        (self.input_shape[1], self.input_shape[2], self.input_shape[3])
    }

    /// Target row of sample `i`, if present.
    #[must_use]
    pub fn target(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.num_outputs)?;
        self.targets.get(start..start + self.num_outputs)
    }

    /// Index of the largest target entry per sample.
    ///
    /// For one-hot targets this is the class index.
    #[must_use]
    pub fn target_classes(&self) -> Vec<usize> {
        if self.num_outputs == 0 {
            return Vec::new();
        }
        self.targets
            .chunks_exact(self.num_outputs)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 { (i, v) } else { best }
                    })
                    .0
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_types::ColorType;

    #[test]
    fn collate_concatenates() {
        let inputs = vec![
            Image::filled(2, 1, ColorType::Gray, 0.0),
            Image::filled(2, 1, ColorType::Gray, 1.0),
        ];
        let targets = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let batch = Batch::collate(&inputs, &targets).unwrap_or_default();
        assert_eq!(batch.inputs, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(batch.input_shape, [2, 1, 2, 1]);
        assert_eq!(batch.target(1), Some(&[0.0, 1.0][..]));
        assert_eq!(batch.target(2), None);
        assert_eq!(batch.target_classes(), vec![0, 1]);
    }

    #[test]
    fn collate_rejects_empty() {
        let targets: Vec<Vec<f32>> = Vec::new();
        assert_eq!(Batch::collate(&[], &targets), Err(DatasetError::EmptyBatch));
    }

    #[test]
    fn collate_rejects_mixed_shapes() {
        let inputs = vec![
            Image::zeros(2, 2, ColorType::Rgb),
            Image::zeros(2, 2, ColorType::Gray),
        ];
        let targets = vec![vec![1.0], vec![1.0]];

        assert!(matches!(
            Batch::collate(&inputs, &targets),
            Err(DatasetError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn collate_rejects_ragged_targets() {
        let inputs = vec![Image::zeros(1, 1, ColorType::Gray); 2];
        let targets = vec![vec![1.0, 0.0], vec![1.0]];

        assert!(Batch::collate(&inputs, &targets).is_err());
    }

    #[test]
    fn clear_keeps_shape() {
        let inputs = vec![Image::zeros(3, 3, ColorType::Rgb)];
        let mut batch = Batch::collate(&inputs, &[[0.0_f32, 1.0]]).unwrap_or_default();
        batch.clear();

        assert!(batch.is_empty());
        assert_eq!(batch.sample_dims(), (3, 3, 3));
        assert!(batch.push(&inputs[0], &[1.0, 0.0]).is_ok());
        assert_eq!(batch.len(), 1);
    }
}
