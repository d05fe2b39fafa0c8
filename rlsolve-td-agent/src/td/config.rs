//! Configuration of TD solver.
use anyhow::Result;
use rlsolve_core::{config::SolverConfig, error::SolverError};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Target used by the TD update.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum TdUpdate {
    /// `r + gamma * max_a' Q(s', a')`.
    #[serde(rename = "qlearn")]
    QLearn,

    /// `r + gamma * Q(s', a')` with the action actually chosen in `s'`.
    #[serde(rename = "sarsa")]
    Sarsa,
}

/// Constructs [`TdSolver`](super::TdSolver).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TdConfig {
    pub(super) alpha: f64,
    pub(super) epsilon: f64,
    pub(super) gamma: f64,
    pub(super) beta: f64,
    pub(super) lambda: f64,
    pub(super) number_of_planning_steps: usize,
    pub(super) update: TdUpdate,
    pub(super) q_init_value: f64,
    pub(super) smooth_policy_update: bool,
    pub(super) replacing_traces: bool,
    #[serde(default = "default_seed")]
    pub(super) seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl Default for TdConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            epsilon: 0.1,
            gamma: 0.75,
            beta: 0.01,
            lambda: 0.0,
            number_of_planning_steps: 0,
            update: TdUpdate::QLearn,
            q_init_value: 0.0,
            smooth_policy_update: false,
            replacing_traces: false,
            seed: default_seed(),
        }
    }
}

impl TdConfig {
    /// Learning rate.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Probability of taking a uniformly random legal action.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Step size of smooth policy updates.
    pub fn beta(mut self, v: f64) -> Self {
        self.beta = v;
        self
    }

    /// Trace decay. `0` disables eligibility traces.
    pub fn lambda(mut self, v: f64) -> Self {
        self.lambda = v;
        self
    }

    /// Number of model-based updates per learning step. `0` disables planning.
    pub fn number_of_planning_steps(mut self, v: usize) -> Self {
        self.number_of_planning_steps = v;
        self
    }

    /// Update rule.
    pub fn update(mut self, v: TdUpdate) -> Self {
        self.update = v;
        self
    }

    /// Initial action value of every pair.
    pub fn q_init_value(mut self, v: f64) -> Self {
        self.q_init_value = v;
        self
    }

    /// If `true`, the policy moves toward the greedy one by `beta` instead of
    /// jumping to it.
    pub fn smooth_policy_update(mut self, v: bool) -> Self {
        self.smooth_policy_update = v;
        self
    }

    /// If `true`, a visit sets the trace to 1 instead of adding 1.
    pub fn replacing_traces(mut self, v: bool) -> Self {
        self.replacing_traces = v;
        self
    }

    /// Seed of the random number generator used by
    /// [`TdSolver::build`](super::TdSolver::build).
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

fn check_unit_interval(name: &str, v: f64) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(SolverError::InvalidConfig(format!("{} must be in [0, 1], got {}", name, v)).into())
    }
}

impl SolverConfig for TdConfig {
    fn validate(&self) -> Result<()> {
        if !(self.alpha >= 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            ))
            .into());
        }
        check_unit_interval("epsilon", self.epsilon)?;
        check_unit_interval("gamma", self.gamma)?;
        check_unit_interval("lambda", self.lambda)?;
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(
                SolverError::InvalidConfig(format!("beta must be in (0, 1], got {}", self.beta))
                    .into(),
            );
        }
        if !self.q_init_value.is_finite() {
            return Err(SolverError::InvalidConfig("q_init_value must be finite".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{TdConfig, TdUpdate};
    use anyhow::Result;
    use rlsolve_core::{config::SolverConfig, error::SolverError};
    use tempdir::TempDir;

    #[test]
    fn test_lookup_by_name() {
        let config = TdConfig::default()
            .update(TdUpdate::Sarsa)
            .number_of_planning_steps(5)
            .lambda(0.8);

        assert_eq!(config.get("lambda").and_then(|v| v.as_f64()), Some(0.8));
        assert_eq!(
            config.get("number_of_planning_steps").and_then(|v| v.as_u64()),
            Some(5)
        );
        assert_eq!(
            config.get("update").and_then(|v| v.as_str().map(String::from)),
            Some("sarsa".to_string())
        );
        assert!(config.get("nonexistent").is_none());
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let tmp_dir = TempDir::new("td_config")?;
        let path = tmp_dir.path().join("td.yaml");
        let config = TdConfig::default()
            .alpha(0.2)
            .smooth_policy_update(true)
            .replacing_traces(true);
        config.save(&path)?;
        let loaded = TdConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TdConfig::default().validate().is_ok());

        let err = TdConfig::default().epsilon(1.5).validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SolverError>(),
            Some(SolverError::InvalidConfig(_))
        ));
        assert!(TdConfig::default().alpha(-0.1).validate().is_err());
        assert!(TdConfig::default().gamma(f64::NAN).validate().is_err());
        assert!(TdConfig::default().beta(0.0).validate().is_err());
    }
}
