//! Exploration strategy of DQN.
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with linearly decaying epsilon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at step 0.
    pub eps_start: f64,

    /// Epsilon from `final_step` on.
    pub eps_final: f64,

    /// Number of steps over which epsilon decays.
    pub final_step: usize,
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new(eps_start: f64, eps_final: f64, final_step: usize) -> Self {
        Self {
            eps_start,
            eps_final,
            final_step,
        }
    }

    /// Epsilon after `step` learning steps.
    pub fn epsilon(&self, step: usize) -> f64 {
        if step < self.final_step {
            let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
            self.eps_start - d * step as f64
        } else {
            self.eps_final
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EpsilonGreedy;

    #[test]
    fn test_linear_decay() {
        let explorer = EpsilonGreedy::new(1.0, 0.1, 10);
        assert_eq!(explorer.epsilon(0), 1.0);
        assert!((explorer.epsilon(5) - 0.55).abs() < 1e-12);
        assert!((explorer.epsilon(9) - 0.19).abs() < 1e-12);
        assert_eq!(explorer.epsilon(10), 0.1);
        assert_eq!(explorer.epsilon(1_000), 0.1);

        let mut prev = f64::INFINITY;
        for step in 0..20 {
            let eps = explorer.epsilon(step);
            assert!(eps <= prev);
            assert!(eps >= 0.1);
            prev = eps;
        }
    }
}
