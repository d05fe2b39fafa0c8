//! Tabular temporal-difference solver.
//!
//! [`TdSolver`] keeps one action value per (state, action) pair and a
//! stochastic policy derived from them. It supports TD(lambda) credit
//! assignment through eligibility traces and prioritized sweeping, a planning
//! step replaying transitions of a learned one-step model of the environment.
pub mod td;
pub use td::{TdConfig, TdSolver, TdUpdate};
