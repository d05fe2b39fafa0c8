//! TD solver.
mod base;
mod config;
mod planning;
pub use base::TdSolver;
pub use config::{TdConfig, TdUpdate};
