//! Short-term memory of a solver.
use serde::{Deserialize, Serialize};

/// A complete `(s0, a0, r0, s1, a1)` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition<S> {
    /// State before the action.
    pub s0: S,
    /// Action taken in `s0`.
    pub a0: usize,
    /// Reward received for `a0`.
    pub r0: f64,
    /// Resulting state.
    pub s1: S,
    /// Action chosen in `s1`.
    pub a1: usize,
}

impl<S: Clone> Transition<&S> {
    /// Copies the borrowed states into an owned transition.
    pub fn cloned(&self) -> Transition<S> {
        Transition {
            s0: self.s0.clone(),
            a0: self.a0,
            r0: self.r0,
            s1: self.s1.clone(),
            a1: self.a1,
        }
    }
}

/// The SARSA tuple a solver is building up.
///
/// Each field stays `None` until the corresponding event has happened:
/// [`Sarsa::shift_state`] moves `(s1, a1)` into `(s0, a0)` and stores the new
/// decision, [`Sarsa::shift_reward`] stores the reward of the latest decision.
/// A full [`Transition`] is available once two decisions and one reward have
/// been observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sarsa<S> {
    s0: Option<S>,
    a0: Option<usize>,
    r0: Option<f64>,
    s1: Option<S>,
    a1: Option<usize>,
}

impl<S> Default for Sarsa<S> {
    fn default() -> Self {
        Self {
            s0: None,
            a0: None,
            r0: None,
            s1: None,
            a1: None,
        }
    }
}

impl<S> Sarsa<S> {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Records a decision, shifting the previous one into `(s0, a0)`.
    pub fn shift_state(&mut self, s: S, a: usize) {
        self.s0 = self.s1.take();
        self.a0 = self.a1.take();
        self.s1 = Some(s);
        self.a1 = Some(a);
    }

    /// Records the reward of the latest decision.
    pub fn shift_reward(&mut self, r: f64) {
        self.r0 = Some(r);
    }

    /// Returns the full transition if every field is known.
    pub fn transition(&self) -> Option<Transition<&S>> {
        Some(Transition {
            s0: self.s0.as_ref()?,
            a0: self.a0?,
            r0: self.r0?,
            s1: self.s1.as_ref()?,
            a1: self.a1?,
        })
    }

    /// Reward stored by the last call to [`Sarsa::shift_reward`].
    pub fn r0(&self) -> Option<f64> {
        self.r0
    }

    /// Latest action.
    pub fn a1(&self) -> Option<usize> {
        self.a1
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.s0.is_none()
            && self.a0.is_none()
            && self.r0.is_none()
            && self.s1.is_none()
            && self.a1.is_none()
    }
}
