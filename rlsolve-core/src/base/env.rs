//! Environment capability.
//!
//! Solvers never simulate an environment. They only ask it how large its
//! state and action spaces are and, for tabular solvers, which actions are
//! legal in a given state.

/// Sizes of the discrete state and action spaces of an environment.
pub trait EnvSpace {
    /// Number of states.
    ///
    /// For a function-approximation solver this is the length of a state vector.
    fn number_of_states(&self) -> usize;

    /// Number of actions.
    fn number_of_actions(&self) -> usize;
}

/// An environment whose legal actions depend on the state.
pub trait TabularEnv: EnvSpace {
    /// Returns the legal action indices in `state`, in a fixed order.
    fn allowed_actions(&self, state: usize) -> Vec<usize>;
}

impl<T: EnvSpace + ?Sized> EnvSpace for &T {
    fn number_of_states(&self) -> usize {
        (**self).number_of_states()
    }

    fn number_of_actions(&self) -> usize {
        (**self).number_of_actions()
    }
}

impl<T: TabularEnv + ?Sized> TabularEnv for &T {
    fn allowed_actions(&self, state: usize) -> Vec<usize> {
        (**self).allowed_actions(state)
    }
}
