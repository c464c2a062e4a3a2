//! Contract checks for learning methods.

use std::fmt::Debug;

use ml_types::{Context, Image};
use rand::Rng;
use tracing::debug;

use crate::error::{MethodError, Result};
use crate::method::MockMethod;

/// Exercises a method end to end on mock data in every context.
///
/// For each [`Context`] this encodes a mock sample and checks that:
/// - the encoded input has [`input_dims`](crate::LearningMethod::input_dims)
/// - the encoded target has [`num_outputs`](crate::LearningMethod::num_outputs) entries
/// - decoding the encoded target gives back the target
/// - the mock model's scores decode
///
/// # Errors
///
/// Returns [`MethodError::Contract`] naming the first violated check, or the
/// method's own error if encoding or decoding fails outright.
///
/// # Example
///
/// ```
/// use ml_methods::{ImageClassification, check_method};
/// use rand::SeedableRng;
///
/// let method = ImageClassification::new(vec![0_u8, 1, 2], 16, 16)
///     .unwrap_or_else(|e| panic!("{e}"));
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// assert!(check_method(&method, &mut rng).is_ok());
/// ```
pub fn check_method<M, R>(method: &M, rng: &mut R) -> Result<()>
where
    M: MockMethod<Input = Image>,
    M::Target: PartialEq + Debug,
    R: Rng,
{
    let dims = method.input_dims();
    let outputs = method.num_outputs();
    let model = method.mock_model();

    for context in Context::ALL {
        let sample = method.mock_sample(rng);

        let x = method.encode_input(context, &sample.input, rng)?;
        if x.dims() != dims {
            return Err(MethodError::contract(format!(
                "{context} input encoded to {:?}, expected {dims:?}",
                x.dims()
            )));
        }

        let y = method.encode_target(context, &sample.target)?;
        if y.len() != outputs {
            return Err(MethodError::contract(format!(
                "{context} target encoded to {} values, expected {outputs}",
                y.len()
            )));
        }

        let decoded = method.decode_prediction(context, &y)?;
        if decoded != sample.target {
            return Err(MethodError::contract(format!(
                "{context} target {:?} decoded as {decoded:?}",
                sample.target
            )));
        }

        if model.num_outputs() != outputs {
            return Err(MethodError::contract(format!(
                "mock model has {} outputs, expected {outputs}",
                model.num_outputs()
            )));
        }
        method.decode_prediction(context, &model.forward(&x, rng))?;

        debug!(context = %context, "method contract holds");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ImageClassification;
    use crate::method::LearningMethod;
    use crate::mock::MockClassifier;
    use crate::multilabel::ImageMultiLabel;
    use burn::prelude::Backend;
    use ml_models::{ConvBackbone, ImageClassifier};
    use ml_training::LossFunction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn builtin_methods_pass() {
        let single = ImageClassification::new(vec!["cat", "dog", "bird"], 12, 10)
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(check_method(&single, &mut rng()), Ok(()));

        let multi = ImageMultiLabel::new(vec!['a', 'b', 'c', 'd'], 8, 8)
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(check_method(&multi, &mut rng()), Ok(()));
    }

    /// Wraps a classifier but misreports its output size.
    struct Misreporting(ImageClassification<u8>);

    impl LearningMethod for Misreporting {
        type Input = Image;
        type Target = u8;

        fn input_dims(&self) -> (usize, usize, usize) {
            self.0.input_dims()
        }

        fn num_outputs(&self) -> usize {
            self.0.num_outputs() + 1
        }

        fn buffered(&self) -> bool {
            false
        }

        fn encode_input<R: Rng>(&self, context: Context, input: &Image, rng: &mut R) -> Result<Image> {
            self.0.encode_input(context, input, rng)
        }

        fn encode_target_into(&self, context: Context, target: &u8, out: &mut [f32]) -> Result<()> {
            let n = self.0.num_outputs();
            out.fill(0.0);
            self.0.encode_target_into(context, target, &mut out[..n])
        }

        fn decode_prediction(&self, context: Context, scores: &[f32]) -> Result<u8> {
            let n = self.0.num_outputs().min(scores.len());
            self.0.decode_prediction(context, &scores[..n])
        }

        fn build_model<B: Backend>(
            &self,
            backbone: ConvBackbone<B>,
            device: &B::Device,
        ) -> Result<ImageClassifier<B>> {
            self.0.build_model(backbone, device)
        }

        fn loss_function(&self) -> LossFunction {
            self.0.loss_function()
        }
    }

    impl MockMethod for Misreporting {
        fn mock_input<R: Rng>(&self, rng: &mut R) -> Image {
            self.0.mock_input(rng)
        }

        fn mock_target<R: Rng>(&self, rng: &mut R) -> u8 {
            self.0.mock_target(rng)
        }

        fn mock_model(&self) -> MockClassifier {
            MockClassifier::new(self.0.num_outputs())
        }
    }

    #[test]
    fn mismatched_mock_model_is_a_violation() {
        let inner =
            ImageClassification::new(vec![1, 2], 4, 4).unwrap_or_else(|err| panic!("{err}"));
        let result = check_method(&Misreporting(inner), &mut rng());
        assert!(matches!(result, Err(MethodError::Contract(_))));
    }
}
