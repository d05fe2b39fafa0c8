//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum SolverError {
    /// The operation is part of the solver contract but not supported by the solver.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// The environment reported a state or action space the solver cannot work with.
    #[error("Invalid space: {number_of_states} states, {number_of_actions} actions")]
    InvalidSpace {
        /// Number of states reported by the environment.
        number_of_states: usize,
        /// Number of actions reported by the environment.
        number_of_actions: usize,
    },

    /// A state index outside of the sized state space.
    #[error("State {state} is out of range (number of states: {number_of_states})")]
    StateOutOfRange {
        /// Given state.
        state: usize,
        /// Number of states of the environment.
        number_of_states: usize,
    },

    /// A state vector whose length differs from the input size of the network.
    #[error("State vector has length {got}, expected {expected}")]
    StateDimension {
        /// Expected length.
        expected: usize,
        /// Given length.
        got: usize,
    },

    /// The environment allows no action in the given state.
    #[error("No allowed actions in state {0}")]
    NoAllowedActions(usize),

    /// Configuration error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot does not match the solver it is restored into.
    #[error("Snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
