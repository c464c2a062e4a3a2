//! End-to-end one-cycle training of an image classifier.
//!
//! Runs on the CPU `NdArray` backend with a tiny synthetic dataset.
//!
//! Run with: cargo test -p ml-methods --test one_cycle_training

#![allow(clippy::unwrap_used, clippy::expect_used)]

use burn::backend::Autodiff;
use burn::optim::Optimizer;
use burn::prelude::Backend;
use burn_ndarray::NdArray;
use ml_dataset::{LabeledSample, LoaderConfig};
use ml_methods::{ImageClassification, LearningMethod, MethodDataLoader};
use ml_models::{ConvBackboneConfig, ImageClassifier};
use ml_training::{
    BatchSource, Learn, Learner, LearningRateSchedule, OneCycle, TrainingConfig, TrainingError,
    batch_tensors, fit_one_cycle,
};
use ml_types::{ColorType, Context, Image};

type TestBackend = Autodiff<NdArray<f32>>;
type Method = ImageClassification<&'static str>;

const CLASSES: [&str; 3] = ["cat", "dog", "bird"];

fn method() -> Method {
    ImageClassification::new(CLASSES.to_vec(), 8, 8).unwrap()
}

/// Each class is a flat image of its own brightness, at varying sizes.
fn samples(n: usize) -> Vec<LabeledSample<Image, &'static str>> {
    (0..n)
        .map(|i| {
            let class = i % CLASSES.len();
            let value = 0.2 + 0.3 * class as f32;
            let image = Image::filled(10 + i % 5, 9 + i % 4, ColorType::Rgb, value);
            LabeledSample::new(image, CLASSES[class])
        })
        .collect()
}

fn loader(
    samples: Vec<LabeledSample<Image, &'static str>>,
    context: Context,
) -> MethodDataLoader<Method> {
    let config = LoaderConfig::default()
        .with_batch_size(3)
        .with_shuffle(context == Context::Training)
        .with_seed(7);
    MethodDataLoader::new(method(), samples, context, config).unwrap()
}

fn learner(
    train: Vec<LabeledSample<Image, &'static str>>,
) -> Learner<
    TestBackend,
    impl Optimizer<ImageClassifier<TestBackend>, TestBackend>,
    MethodDataLoader<Method>,
> {
    let device = <TestBackend as Backend>::Device::default();
    let method = method();
    let backbone = ConvBackboneConfig::new(vec![4, 8])
        .init::<TestBackend>(&device)
        .unwrap();
    let model = method.build_model(backbone, &device).unwrap();

    let config = TrainingConfig::new(3).with_seed(0);
    let optimizer = config
        .optimizer
        .init::<TestBackend, ImageClassifier<TestBackend>>(config.gradient_clip);

    Learner::new(model, optimizer, config, loader(train, Context::Training), device)
        .unwrap()
        .with_validation(loader(samples(6), Context::Validation))
        .with_loss(method.loss_function())
}

#[test]
fn fit_one_cycle_follows_schedule() {
    let mut learner = learner(samples(30));
    assert_eq!(learner.steps_per_epoch(), 10);

    fit_one_cycle(&mut learner, 3, OneCycle::default()).unwrap();

    let state = learner.state();
    assert_eq!(state.global_step, 30);
    assert_eq!(state.metrics.epochs_completed(), 3);

    let lrs = &state.learning_rates;
    assert_eq!(lrs.len(), 30);
    let peak = lrs
        .iter()
        .enumerate()
        .fold(0, |best, (i, &lr)| if lr > lrs[best] { i } else { best });
    assert_eq!(peak, 8);
    assert_eq!(lrs[8], 0.01);
    assert!((lrs[0] - 0.01 / 25.0).abs() < 1e-12);
    assert!((lrs[29] - 0.01 / 1e5).abs() < 1e-12);
    assert!(lrs[..=8].windows(2).all(|w| w[0] <= w[1]));
    assert!(lrs[8..].windows(2).all(|w| w[0] >= w[1]));

    let accuracy = state.metrics.final_val_accuracy().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
}

#[test]
fn fit_one_cycle_restores_previous_scheduler() {
    let mut learner = learner(samples(9));
    let previous = LearningRateSchedule::cosine(1e-5);
    learner.set_scheduler(Some(previous));

    fit_one_cycle(&mut learner, 1, OneCycle::new(0.005)).unwrap();
    assert_eq!(learner.scheduler(), Some(&previous));

    // Without an installed scheduler the config schedule applies again.
    learner.set_scheduler(None);
    learner.fit(1).unwrap();
    let lrs = &learner.state().learning_rates;
    assert_eq!(lrs.len(), 6);
    assert!(lrs[3..].iter().all(|&lr| lr == 1e-3));
}

#[test]
fn fit_one_cycle_restores_scheduler_on_error() {
    let mut train = samples(6);
    train[4].target = "fish";
    let mut learner = learner(train);
    let previous = LearningRateSchedule::cosine(1e-6);
    learner.set_scheduler(Some(previous));

    let result = fit_one_cycle(&mut learner, 2, OneCycle::default());
    assert!(matches!(result, Err(TrainingError::Dataset(_))));
    assert_eq!(learner.scheduler(), Some(&previous));
}

#[test]
fn fit_one_cycle_restores_empty_scheduler_on_error() {
    let mut train = samples(6);
    train[1].target = "fish";
    let mut learner = learner(train);
    learner.set_scheduler(None);

    let result = fit_one_cycle(&mut learner, 1, OneCycle::default());
    assert!(result.is_err());
    assert_eq!(learner.scheduler(), None);
}

#[test]
fn trained_model_decodes_to_known_classes() {
    let mut learner = learner(samples(12));
    fit_one_cycle(&mut learner, 2, OneCycle::new(0.02)).unwrap();

    let method = method();
    let model = learner.into_model();
    let device = <TestBackend as Backend>::Device::default();

    let mut loader = loader(samples(3), Context::Inference);
    loader.start_epoch(0);
    let batch = loader.encode_batch(0).unwrap();
    let (inputs, _) = batch_tensors::<TestBackend>(&batch, &device).unwrap();
    let scores = model
        .forward(inputs)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .unwrap();

    for row in scores.chunks_exact(method.num_outputs()) {
        let label = method.decode_prediction(Context::Inference, row).unwrap();
        assert!(CLASSES.contains(&label));
    }
}
