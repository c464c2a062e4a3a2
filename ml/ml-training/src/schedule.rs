//! One-cycle learning rate policy.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingError};

/// Parameters of a one-cycle run.
///
/// The learning rate warms up from `lr_max / div` to `lr_max` over the first
/// `pct_start` of the steps, then anneals to `lr_max / div_final`. Both phases
/// follow a half cosine.
///
/// # Example
///
/// ```
/// use ml_training::OneCycle;
///
/// let params = OneCycle::default();
/// assert_eq!(params.lr_max, 0.01);
/// assert_eq!(params.div, 25.0);
///
/// let schedule = params.schedule(30).ok();
/// assert_eq!(schedule.map(|s| s.peak()), Some(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneCycle {
    /// Peak learning rate.
    pub lr_max: f64,

    /// Divisor giving the initial learning rate.
    pub div: f64,

    /// Divisor giving the final learning rate.
    pub div_final: f64,

    /// Fraction of the steps spent warming up.
    pub pct_start: f64,
}

impl Default for OneCycle {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl OneCycle {
    /// Creates parameters with the given peak and default divisors.
    #[must_use]
    pub const fn new(lr_max: f64) -> Self {
        Self {
            lr_max,
            div: 25.0,
            div_final: 1e5,
            pct_start: 0.25,
        }
    }

    /// Sets the initial divisor.
    #[must_use]
    pub const fn with_div(mut self, div: f64) -> Self {
        self.div = div;
        self
    }

    /// Sets the final divisor.
    #[must_use]
    pub const fn with_div_final(mut self, div_final: f64) -> Self {
        self.div_final = div_final;
        self
    }

    /// Sets the warmup fraction.
    #[must_use]
    pub const fn with_pct_start(mut self, pct_start: f64) -> Self {
        self.pct_start = pct_start;
        self
    }

    /// Learning rate at step 0.
    #[must_use]
    pub fn initial_lr(&self) -> f64 {
        self.lr_max / self.div
    }

    /// Learning rate at the last step.
    #[must_use]
    pub fn final_lr(&self) -> f64 {
        self.lr_max / self.div_final
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first parameter out of range.
    pub fn validate(&self) -> Result<()> {
        if !(self.lr_max.is_finite() && self.lr_max > 0.0) {
            return Err(TrainingError::invalid_config(format!(
                "lr_max must be > 0, got {}",
                self.lr_max
            )));
        }
        if !(self.div.is_finite() && self.div >= 1.0) {
            return Err(TrainingError::invalid_config(format!(
                "div must be >= 1, got {}",
                self.div
            )));
        }
        if !(self.div_final.is_finite() && self.div_final >= 1.0) {
            return Err(TrainingError::invalid_config(format!(
                "div_final must be >= 1, got {}",
                self.div_final
            )));
        }
        if !(0.0..=1.0).contains(&self.pct_start) {
            return Err(TrainingError::invalid_config(format!(
                "pct_start must be in [0, 1], got {}",
                self.pct_start
            )));
        }
        Ok(())
    }

    /// Builds the schedule for a run of `total_steps` optimizer steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or `total_steps` is 0.
    pub fn schedule(&self, total_steps: usize) -> Result<OneCycleSchedule> {
        self.validate()?;
        if total_steps == 0 {
            return Err(TrainingError::invalid_config("total_steps must be > 0"));
        }
        Ok(OneCycleSchedule {
            params: *self,
            total_steps,
            peak: peak_step(self.pct_start, total_steps),
        })
    }
}

/// `round(pct_start * total)` with ties away from zero, kept inside the run.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn peak_step(pct_start: f64, total_steps: usize) -> usize {
    let peak = (pct_start * total_steps as f64).round().max(0.0) as usize;
    peak.min(total_steps - 1)
}

/// Half-cosine interpolation: `from` at `t = 0`, `to` at `t = 1`.
fn cosine_interp(from: f64, to: f64, t: f64) -> f64 {
    to + (from - to) * (1.0 + (std::f64::consts::PI * t).cos()) / 2.0
}

/// A one-cycle schedule bound to a run length.
///
/// A pure function of the step index. Steps past the end return the final
/// learning rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneCycleSchedule {
    params: OneCycle,
    total_steps: usize,
    peak: usize,
}

impl OneCycleSchedule {
    /// The parameters this schedule was built from.
    #[must_use]
    pub const fn params(&self) -> &OneCycle {
        &self.params
    }

    /// Number of steps in the run.
    #[must_use]
    pub const fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Step at which `lr_max` is reached.
    #[must_use]
    pub const fn peak(&self) -> usize {
        self.peak
    }

    /// Learning rate for `step`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn learning_rate(&self, step: usize) -> f64 {
        let OneCycle { lr_max, .. } = self.params;
        let step = step.min(self.total_steps - 1);

        if step <= self.peak {
            if self.peak == 0 {
                return lr_max;
            }
            let t = step as f64 / self.peak as f64;
            cosine_interp(self.params.initial_lr(), lr_max, t)
        } else {
            // step > peak implies peak < total_steps - 1
            let span = (self.total_steps - 1 - self.peak) as f64;
            let t = (step - self.peak) as f64 / span;
            cosine_interp(lr_max, self.params.final_lr(), t)
        }
    }

    /// Learning rates for every step of the run.
    #[must_use]
    pub fn learning_rates(&self) -> Vec<f64> {
        (0..self.total_steps)
            .map(|step| self.learning_rate(step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn schedule(params: OneCycle, total: usize) -> OneCycleSchedule {
        params
            .schedule(total)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn defaults() {
        let params = OneCycle::default();
        assert_eq!(params.lr_max, 0.01);
        assert_eq!(params.div, 25.0);
        assert_eq!(params.div_final, 1e5);
        assert_eq!(params.pct_start, 0.25);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn peak_rounds_half_away_from_zero() {
        // 0.25 * 30 = 7.5
        assert_eq!(schedule(OneCycle::default(), 30).peak(), 8);
        assert_eq!(schedule(OneCycle::default(), 100).peak(), 25);
        assert_eq!(schedule(OneCycle::default(), 1).peak(), 0);
    }

    #[test]
    fn peak_clamped_to_last_step() {
        let s = schedule(OneCycle::default().with_pct_start(1.0), 10);
        assert_eq!(s.peak(), 9);
        assert_eq!(s.learning_rate(9), 0.01);
    }

    #[test]
    fn endpoints() {
        let s = schedule(OneCycle::default(), 30);
        assert_relative_eq!(s.learning_rate(0), 0.01 / 25.0, max_relative = 1e-12);
        assert_eq!(s.learning_rate(8), 0.01);
        assert_relative_eq!(s.learning_rate(29), 0.01 / 1e5, max_relative = 1e-9);
    }

    #[test]
    fn maximum_at_peak() {
        let s = schedule(OneCycle::new(0.1), 57);
        let rates = s.learning_rates();
        let (argmax, max) = rates
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &lr)| if lr > best.1 { (i, lr) } else { best });
        assert_eq!(argmax, s.peak());
        assert_eq!(max, 0.1);
    }

    #[test]
    fn rises_then_falls() {
        let rates = schedule(OneCycle::default(), 40).learning_rates();
        let peak = 10;
        assert!(rates[..=peak].windows(2).all(|w| w[0] <= w[1]));
        assert!(rates[peak..].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn steps_are_close_together() {
        let rates = schedule(OneCycle::default(), 1000).learning_rates();
        let max_jump = rates
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max);
        assert!(max_jump < 0.001);
    }

    #[test]
    fn past_end_clamps() {
        let s = schedule(OneCycle::default(), 12);
        assert_eq!(s.learning_rate(11), s.learning_rate(500));
    }

    #[test]
    fn zero_pct_start_starts_at_max() {
        let s = schedule(OneCycle::default().with_pct_start(0.0), 5);
        assert_eq!(s.peak(), 0);
        assert_eq!(s.learning_rate(0), 0.01);
        assert!(s.learning_rate(4) < s.learning_rate(1));
    }

    #[test]
    fn rejects_bad_params() {
        assert!(OneCycle::new(0.0).validate().is_err());
        assert!(OneCycle::new(f64::NAN).validate().is_err());
        assert!(OneCycle::default().with_div(0.5).validate().is_err());
        assert!(OneCycle::default().with_div_final(0.0).validate().is_err());
        assert!(OneCycle::default().with_pct_start(1.5).validate().is_err());
        assert!(OneCycle::default().with_pct_start(-0.1).validate().is_err());
    }

    #[test]
    fn rejects_empty_run() {
        let result = OneCycle::default().schedule(0);
        assert!(matches!(result, Err(TrainingError::InvalidConfig(_))));
    }

    #[test]
    fn serialization() {
        let params = OneCycle::new(3e-3).with_pct_start(0.3);
        let json = serde_json::to_string(&params).unwrap_or_default();
        let parsed: Option<OneCycle> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(params));
    }
}
