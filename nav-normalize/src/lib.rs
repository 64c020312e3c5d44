//! `nav-normalize` — C5, the VC2 reward/value normalizer.
//!
//! Grounded on `original_source/ia_ml/src/envs/reward_normalizer.py`'s
//! `RunningMeanStd`/`RewardNormalizer` pair for the online per-step
//! reward-shaping path, and on `test_reward_vc2.py` for the batch
//! `VC2Normalizer` API the retained Python draft never finished writing
//! (`push_value_batch`, `normalize_returns_values`, `denormalize_value`) —
//! that test is the authoritative source for method names and shapes here,
//! since the draft only ever implemented the single-reward half of the
//! normalizer.

use nav_core::{ResetInfo, Result, StepEnv, StepOutcome};

/// Welford's batched running mean/variance estimator. `count` starts at
/// `eps` rather than zero so the very first `update` doesn't divide by
/// zero, matching the original's `count: float = eps`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningMeanStd {
    pub mean: f64,
    pub var: f64,
    pub count: f64,
}

impl RunningMeanStd {
    pub fn new(eps: f64) -> Self {
        Self { mean: 0.0, var: 1.0, count: eps }
    }

    /// Folds a batch into the running estimate via the parallel-variance
    /// (Chan et al.) formula: combines this estimator's `(mean, var,
    /// count)` with the batch's own moments rather than replaying every
    /// sample through an incremental update.
    pub fn update(&mut self, batch: &[f64]) {
        if batch.is_empty() {
            return;
        }
        let batch_count = batch.len() as f64;
        let batch_mean = batch.iter().sum::<f64>() / batch_count;
        let batch_var = batch.iter().map(|x| (x - batch_mean).powi(2)).sum::<f64>() / batch_count;

        let delta = batch_mean - self.mean;
        let tot_count = self.count + batch_count;
        let new_mean = self.mean + delta * (batch_count / tot_count);
        let m_a = self.var * self.count;
        let m_b = batch_var * batch_count;
        let m2 = m_a + m_b + delta.powi(2) * (self.count * batch_count / tot_count);

        self.mean = new_mean;
        self.var = m2 / tot_count;
        self.count = tot_count;
    }

    pub fn std(&self) -> f64 {
        self.var.sqrt()
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.mean, self.var, self.count)
    }
}

impl Default for RunningMeanStd {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerConfig {
    pub gamma: f64,
    pub clip_range: f64,
    pub eps: f64,
    pub scale: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            clip_range: 10.0,
            eps: 1e-8,
            scale: 1.0,
        }
    }
}

/// Wraps any [`StepEnv`] to rescale its per-step reward online, and
/// separately exposes a batch API (`push_value_batch`,
/// `normalize_returns_values`, `denormalize_value`) for use outside the
/// step loop, against a PPO-style rollout buffer (see `ppo_vc2.py`'s
/// `PPOAgent::update`). The online path and the batch path share
/// `return_rms`: both are estimates of the same discounted-return
/// distribution, just fed from different sources (per-step episodic
/// return vs. a rollout's full return batch).
pub struct VC2Normalizer<E: StepEnv> {
    inner: E,
    config: NormalizerConfig,
    return_rms: RunningMeanStd,
    value_rms: RunningMeanStd,
    episode_ret: f64,
}

impl<E: StepEnv> VC2Normalizer<E> {
    pub fn new(inner: E) -> Self {
        Self::with_config(inner, NormalizerConfig::default())
    }

    pub fn with_config(inner: E, config: NormalizerConfig) -> Self {
        Self {
            inner,
            config,
            return_rms: RunningMeanStd::new(1e-4),
            value_rms: RunningMeanStd::new(1e-4),
            episode_ret: 0.0,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    pub fn get_return_stats(&self) -> (f64, f64, f64) {
        self.return_rms.as_tuple()
    }

    pub fn get_value_stats(&self) -> (f64, f64, f64) {
        self.value_rms.as_tuple()
    }

    /// Folds a batch of critic value estimates into the value running
    /// stats, independent of the step loop.
    pub fn push_value_batch(&mut self, values: &[f64]) {
        self.value_rms.update(values);
    }

    /// Normalizes a rollout's raw returns and raw values against their
    /// respective running stats (folding `returns` into `return_rms` as it
    /// goes, mirroring how `push_value_batch` folds values into
    /// `value_rms`), and returns `(returns_norm, values_norm, advantages)`.
    /// Both series are z-scored (centered and scaled, not merely scaled
    /// like the online per-step reward path) so [`Self::denormalize_value`]
    /// can invert them exactly; advantages are the difference of the two
    /// normalized series.
    pub fn normalize_returns_values(&mut self, returns: &[f64], values: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        self.return_rms.update(returns);
        let return_std = self.return_rms.std() + self.config.eps;
        let value_std = self.value_rms.std() + self.config.eps;

        let returns_norm: Vec<f64> = returns.iter().map(|&r| (r - self.return_rms.mean) / return_std).collect();
        let values_norm: Vec<f64> = values.iter().map(|&v| (v - self.value_rms.mean) / value_std).collect();
        let advantages: Vec<f64> = returns_norm.iter().zip(&values_norm).map(|(r, v)| r - v).collect();

        (returns_norm, values_norm, advantages)
    }

    /// Inverts [`Self::normalize_returns_values`]'s value normalization.
    pub fn denormalize_value(&self, values_norm: &[f64]) -> Vec<f64> {
        let value_std = self.value_rms.std() + self.config.eps;
        values_norm.iter().map(|&v| v * value_std + self.value_rms.mean).collect()
    }
}

impl<E: StepEnv> StepEnv for VC2Normalizer<E> {
    fn reset(&mut self) -> Result<(Vec<f32>, ResetInfo)> {
        self.episode_ret = 0.0;
        self.inner.reset()
    }

    /// Online reward shaping, ported directly from `RewardNormalizer.step`:
    /// accumulate a discounted episodic return, fold it into `return_rms`,
    /// then rescale (not center) the raw immediate reward by the running
    /// standard deviation and clip to `[-clip_range, clip_range]`.
    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        let mut outcome = self.inner.step(action)?;

        let raw_reward = outcome.reward;
        self.episode_ret = self.episode_ret * self.config.gamma + raw_reward;
        self.return_rms.update(&[self.episode_ret]);

        let std = self.return_rms.std() + self.config.eps;
        let norm_reward = (raw_reward / std) * self.config.scale;
        outcome.reward = norm_reward.clamp(-self.config.clip_range, self.config.clip_range);

        if outcome.terminated || outcome.truncated {
            self.episode_ret = 0.0;
        }

        Ok(outcome)
    }

    fn observation_shape(&self) -> usize {
        self.inner.observation_shape()
    }

    fn action_count(&self) -> usize {
        self.inner.action_count()
    }
}
