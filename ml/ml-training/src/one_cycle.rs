//! One-cycle fitting with scoped scheduler installation.

use std::ops::{Deref, DerefMut};

use tracing::{debug, info};

use crate::config::LearningRateSchedule;
use crate::error::{Result, TrainingError};
use crate::schedule::OneCycle;
use crate::trainer::Learn;

/// Installs a scheduler on a learner for the guard's lifetime.
///
/// Dropping the guard puts the previously installed scheduler back, on
/// normal return, on early return with an error, and while unwinding from a
/// panic.
///
/// # Example
///
/// ```ignore
/// use ml_training::{LearningRateSchedule, ScheduleGuard};
///
/// {
///     let mut guard = ScheduleGuard::install(&mut learner, LearningRateSchedule::cosine(0.0));
///     guard.fit(3)?;
/// }
/// // previous scheduler is active again
/// ```
pub struct ScheduleGuard<'a, L: Learn + ?Sized> {
    learner: &'a mut L,
    previous: Option<LearningRateSchedule>,
}

impl<'a, L: Learn + ?Sized> ScheduleGuard<'a, L> {
    /// Installs `schedule`, remembering the scheduler it replaces.
    pub fn install(learner: &'a mut L, schedule: LearningRateSchedule) -> Self {
        let previous = learner.set_scheduler(Some(schedule));
        debug!(had_previous = previous.is_some(), "scheduler installed");
        Self { learner, previous }
    }

    /// The scheduler that will be restored.
    #[must_use]
    pub const fn previous(&self) -> Option<&LearningRateSchedule> {
        self.previous.as_ref()
    }
}

impl<L: Learn + ?Sized> Deref for ScheduleGuard<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        self.learner
    }
}

impl<L: Learn + ?Sized> DerefMut for ScheduleGuard<'_, L> {
    fn deref_mut(&mut self) -> &mut L {
        self.learner
    }
}

impl<L: Learn + ?Sized> Drop for ScheduleGuard<'_, L> {
    fn drop(&mut self) {
        let previous = self.previous.take();
        debug!(
            restoring_previous = previous.is_some(),
            panicking = std::thread::panicking(),
            "scheduler restored"
        );
        self.learner.set_scheduler(previous);
    }
}

/// Trains `learner` for `n_epochs` under a one-cycle learning rate policy.
///
/// The schedule spans `n_epochs * steps_per_epoch` optimizer steps and is
/// installed only for the duration of the call; whatever scheduler was
/// installed before is active again when this returns or unwinds. Training
/// errors are propagated unchanged.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, `n_epochs` is 0, the
/// learner has no training batches, or training fails.
///
/// # Example
///
/// ```ignore
/// use ml_training::{OneCycle, fit_one_cycle};
///
/// fit_one_cycle(&mut learner, 3, OneCycle::default())?;
/// ```
pub fn fit_one_cycle<L: Learn + ?Sized>(
    learner: &mut L,
    n_epochs: usize,
    params: OneCycle,
) -> Result<()> {
    params.validate()?;
    if n_epochs == 0 {
        return Err(TrainingError::invalid_config("n_epochs must be > 0"));
    }

    learner.init_training()?;
    let steps_per_epoch = learner.steps_per_epoch();
    if steps_per_epoch == 0 {
        return Err(TrainingError::dataset("training source has no batches"));
    }
    let total_steps = n_epochs
        .checked_mul(steps_per_epoch)
        .ok_or_else(|| TrainingError::invalid_config("total step count overflows"))?;

    let schedule = params.schedule(total_steps)?;
    info!(
        n_epochs,
        steps_per_epoch,
        total_steps,
        peak_step = schedule.peak(),
        lr_max = params.lr_max,
        "fit_one_cycle"
    );

    let mut guard = ScheduleGuard::install(learner, schedule.into());
    guard.fit(n_epochs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Outcome {
        Succeed,
        Fail,
        Panic,
    }

    /// Records what a real learner would see without any model.
    struct MockLearner {
        steps_per_epoch: usize,
        scheduler: Option<LearningRateSchedule>,
        outcome: Outcome,
        init_calls: usize,
        fitted_epochs: Vec<usize>,
        rates: Vec<f64>,
    }

    impl MockLearner {
        fn new(steps_per_epoch: usize, outcome: Outcome) -> Self {
            Self {
                steps_per_epoch,
                scheduler: None,
                outcome,
                init_calls: 0,
                fitted_epochs: Vec::new(),
                rates: Vec::new(),
            }
        }
    }

    impl Learn for MockLearner {
        fn init_training(&mut self) -> Result<()> {
            self.init_calls += 1;
            Ok(())
        }

        fn steps_per_epoch(&self) -> usize {
            self.steps_per_epoch
        }

        fn scheduler(&self) -> Option<&LearningRateSchedule> {
            self.scheduler.as_ref()
        }

        fn set_scheduler(
            &mut self,
            scheduler: Option<LearningRateSchedule>,
        ) -> Option<LearningRateSchedule> {
            std::mem::replace(&mut self.scheduler, scheduler)
        }

        fn fit(&mut self, epochs: usize) -> Result<()> {
            self.fitted_epochs.push(epochs);
            let total = epochs * self.steps_per_epoch;
            if let Some(schedule) = self.scheduler {
                self.rates = (0..total)
                    .map(|step| schedule.compute_lr(1.0, step, total))
                    .collect();
            }
            match self.outcome {
                Outcome::Succeed => Ok(()),
                Outcome::Fail => Err(TrainingError::numerical_instability("loss is NaN")),
                Outcome::Panic => panic!("fit exploded"),
            }
        }
    }

    const PREVIOUS: LearningRateSchedule = LearningRateSchedule::Exponential { gamma: 0.5 };

    #[test]
    fn runs_one_cycle_schedule() {
        let mut learner = MockLearner::new(10, Outcome::Succeed);
        assert!(fit_one_cycle(&mut learner, 3, OneCycle::default()).is_ok());

        assert_eq!(learner.fitted_epochs, vec![3]);
        assert_eq!(learner.init_calls, 1);
        assert_eq!(learner.rates.len(), 30);
        assert_eq!(learner.rates[8], 0.01);
        assert!((learner.rates[0] - 0.01 / 25.0).abs() < 1e-12);
        assert!((learner.rates[29] - 0.01 / 1e5).abs() < 1e-12);
    }

    #[test]
    fn restores_scheduler_on_success() {
        let mut learner = MockLearner::new(4, Outcome::Succeed);
        learner.set_scheduler(Some(PREVIOUS));

        assert!(fit_one_cycle(&mut learner, 2, OneCycle::default()).is_ok());
        assert_eq!(learner.scheduler(), Some(&PREVIOUS));
    }

    #[test]
    fn restores_empty_slot() {
        let mut learner = MockLearner::new(4, Outcome::Succeed);
        assert!(fit_one_cycle(&mut learner, 1, OneCycle::default()).is_ok());
        assert_eq!(learner.scheduler(), None);
    }

    #[test]
    fn restores_scheduler_on_error() {
        let mut learner = MockLearner::new(4, Outcome::Fail);
        learner.set_scheduler(Some(PREVIOUS));

        let result = fit_one_cycle(&mut learner, 2, OneCycle::default());
        assert_eq!(
            result,
            Err(TrainingError::numerical_instability("loss is NaN"))
        );
        assert_eq!(learner.scheduler(), Some(&PREVIOUS));
    }

    #[test]
    fn restores_scheduler_on_panic() {
        let mut learner = MockLearner::new(4, Outcome::Panic);
        learner.set_scheduler(Some(PREVIOUS));

        let result = catch_unwind(AssertUnwindSafe(|| {
            fit_one_cycle(&mut learner, 2, OneCycle::default())
        }));
        assert!(result.is_err());
        assert_eq!(learner.scheduler(), Some(&PREVIOUS));
        assert_eq!(learner.fitted_epochs, vec![2]);
    }

    #[test]
    fn rejects_zero_steps_before_installing() {
        let mut learner = MockLearner::new(0, Outcome::Succeed);
        learner.set_scheduler(Some(PREVIOUS));

        let result = fit_one_cycle(&mut learner, 2, OneCycle::default());
        assert!(matches!(result, Err(TrainingError::Dataset(_))));
        assert!(learner.fitted_epochs.is_empty());
        assert_eq!(learner.scheduler(), Some(&PREVIOUS));
    }

    #[test]
    fn rejects_invalid_params() {
        let mut learner = MockLearner::new(3, Outcome::Succeed);
        let bad = OneCycle::default().with_pct_start(2.0);

        assert!(matches!(
            fit_one_cycle(&mut learner, 1, bad),
            Err(TrainingError::InvalidConfig(_))
        ));
        assert!(matches!(
            fit_one_cycle(&mut learner, 0, OneCycle::default()),
            Err(TrainingError::InvalidConfig(_))
        ));
        assert!(learner.fitted_epochs.is_empty());
    }

    #[test]
    fn guard_derefs_to_learner() {
        let mut learner = MockLearner::new(5, Outcome::Succeed);
        {
            let guard = ScheduleGuard::install(&mut learner, LearningRateSchedule::cosine(0.0));
            assert_eq!(guard.steps_per_epoch(), 5);
            assert_eq!(
                guard.scheduler(),
                Some(&LearningRateSchedule::cosine(0.0))
            );
            assert!(guard.previous().is_none());
        }
        assert!(learner.scheduler().is_none());
    }
}
