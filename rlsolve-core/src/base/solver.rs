//! Solver.
use crate::record::Record;
use anyhow::Result;
use serde_json::Value;

/// Represents a learning agent on a discrete action space.
///
/// A solver alternates between [`Solver::decide`] and [`Solver::learn`]:
/// `decide` chooses an action for the current state and remembers it,
/// `learn` receives the reward of that decision. Because the outcome of a
/// decision is only known once the next state has been observed, updates lag
/// one step behind: the reward passed to `learn` is used by the update run in
/// the *next* call to `learn`.
pub trait Solver {
    /// State passed to [`Solver::decide`].
    type State: ?Sized;

    /// Reinitializes all learning state from the configuration and the
    /// environment sizing, discarding any prior experience.
    fn reset(&mut self) -> Result<()>;

    /// Chooses an action in `state` and records it in short-term memory.
    fn decide(&mut self, state: &Self::State) -> Result<usize>;

    /// Consumes the reward of the previous decision.
    fn learn(&mut self, reward: f64) -> Result<()> {
        let _ = self.learn_with_record(reward)?;
        Ok(())
    }

    /// Consumes the reward of the previous decision and returns some
    /// information about the updates performed.
    fn learn_with_record(&mut self, reward: f64) -> Result<Record>;

    /// Serializes enough state to resume decision-making.
    fn to_json(&self) -> Result<Value>;

    /// Restores a snapshot produced by [`Solver::to_json`].
    ///
    /// On failure the solver is left unchanged.
    fn from_json(&mut self, json: &Value) -> Result<()>;
}
