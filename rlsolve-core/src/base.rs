//! Core functionalities.
mod env;
mod solver;
pub use env::{EnvSpace, TabularEnv};
pub use solver::Solver;
