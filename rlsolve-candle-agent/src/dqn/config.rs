//! Configuration of DQN solver.
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use rlsolve_core::{config::SolverConfig, error::SolverError};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Constructs [`DqnSolver`](super::DqnSolver).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig {
    pub(super) training_mode: bool,
    pub(super) number_of_hidden_units: Vec<usize>,
    pub(super) epsilon_max: f64,
    pub(super) epsilon_min: f64,
    pub(super) epsilon_decay_period: usize,
    pub(super) epsilon: f64,
    pub(super) gamma: f64,
    pub(super) alpha: f64,
    pub(super) experience_size: usize,
    pub(super) do_loss_clipping: bool,
    pub(super) loss_clamp: f64,
    pub(super) do_reward_clipping: bool,
    pub(super) reward_clamp: f64,
    pub(super) keep_experience_interval: usize,
    pub(super) replay_steps: usize,
    #[serde(default)]
    pub(super) optimizer: OptimizerConfig,
    #[serde(default)]
    pub(super) device: Device,
    #[serde(default = "default_seed")]
    pub(super) seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            training_mode: true,
            number_of_hidden_units: vec![100],
            epsilon_max: 1.0,
            epsilon_min: 0.1,
            epsilon_decay_period: 1_000_000,
            epsilon: 0.05,
            gamma: 0.9,
            alpha: 0.01,
            experience_size: 1_000_000,
            do_loss_clipping: true,
            loss_clamp: 1.0,
            do_reward_clipping: true,
            reward_clamp: 1.0,
            keep_experience_interval: 25,
            replay_steps: 10,
            optimizer: OptimizerConfig::default(),
            device: Device::Cpu,
            seed: default_seed(),
        }
    }
}

impl DqnConfig {
    /// If `true`, epsilon decays with learning steps, otherwise the fixed
    /// `epsilon` is used.
    pub fn training_mode(mut self, v: bool) -> Self {
        self.training_mode = v;
        self
    }

    /// Widths of the hidden layers.
    pub fn number_of_hidden_units(mut self, v: Vec<usize>) -> Self {
        self.number_of_hidden_units = v;
        self
    }

    /// Epsilon at the first learning step in training mode.
    pub fn epsilon_max(mut self, v: f64) -> Self {
        self.epsilon_max = v;
        self
    }

    /// Epsilon after the decay period in training mode.
    pub fn epsilon_min(mut self, v: f64) -> Self {
        self.epsilon_min = v;
        self
    }

    /// Number of learning steps over which epsilon decays.
    pub fn epsilon_decay_period(mut self, v: usize) -> Self {
        self.epsilon_decay_period = v;
        self
    }

    /// Epsilon used out of training mode.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Learning rate. `0` disables learning.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Capacity of the replay memory.
    pub fn experience_size(mut self, v: usize) -> Self {
        self.experience_size = v;
        self
    }

    /// Clips the TD error to `[-loss_clamp, loss_clamp]`.
    pub fn loss_clipping(mut self, enabled: bool, clamp: f64) -> Self {
        self.do_loss_clipping = enabled;
        self.loss_clamp = clamp;
        self
    }

    /// Clips rewards to `[-reward_clamp, reward_clamp]`.
    pub fn reward_clipping(mut self, enabled: bool, clamp: f64) -> Self {
        self.do_reward_clipping = enabled;
        self.reward_clamp = clamp;
        self
    }

    /// A transition is stored in the replay memory every `v` learning steps.
    pub fn keep_experience_interval(mut self, v: usize) -> Self {
        self.keep_experience_interval = v;
        self
    }

    /// Number of replayed transitions per learning step.
    pub fn replay_steps(mut self, v: usize) -> Self {
        self.replay_steps = v;
        self
    }

    /// Optimizer. Its learning rate is replaced by `alpha`.
    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Seed of the random number generator used by
    /// [`DqnSolver::build`](super::DqnSolver::build).
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

fn invalid(msg: String) -> Result<()> {
    Err(SolverError::InvalidConfig(msg).into())
}

impl SolverConfig for DqnConfig {
    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("epsilon_max", self.epsilon_max),
            ("epsilon_min", self.epsilon_min),
            ("epsilon", self.epsilon),
            ("gamma", self.gamma),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return invalid(format!("{} must be in [0, 1], got {}", name, v));
            }
        }
        if !(self.alpha >= 0.0) {
            return invalid(format!("alpha must be non-negative, got {}", self.alpha));
        }
        if !(self.loss_clamp >= 0.0) || !(self.reward_clamp >= 0.0) {
            return invalid("clamps must be non-negative".to_string());
        }
        if self.number_of_hidden_units.is_empty() || self.number_of_hidden_units.contains(&0) {
            return invalid(format!(
                "number_of_hidden_units must be non-empty positive widths, got {:?}",
                self.number_of_hidden_units
            ));
        }
        if self.experience_size == 0 {
            return invalid("experience_size must be positive".to_string());
        }
        if self.keep_experience_interval == 0 {
            return invalid("keep_experience_interval must be positive".to_string());
        }
        if self.epsilon_decay_period == 0 {
            return invalid("epsilon_decay_period must be positive".to_string());
        }
        Ok(())
    }
}
