//! Reinforcement learning solvers in Rust.
//!
//! rlsolve consists of the following crates:
//!
//! * [rlsolve-core](../rlsolve_core/index.html) provides the [`Solver`] trait,
//!   the capability an environment exposes to solvers ([`EnvSpace`],
//!   [`TabularEnv`]), the short-term and replay memories, and configuration
//!   utilities.
//! * [rlsolve-td-agent](../rlsolve_td_agent/index.html) includes a tabular
//!   TD(lambda) solver with prioritized sweeping. It does not depend on any
//!   deep learning backend.
//! * [rlsolve-candle-agent](../rlsolve_candle_agent/index.html) includes a DQN
//!   solver based on [candle](https://crates.io/crates/candle-core).
//!
//! A solver is driven by alternating [`Solver::decide`] and [`Solver::learn`]:
//!
//! ```no_run
//! use rlsolve::{GridSpace, Solver, TdConfig, TdSolver};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut solver = TdSolver::build(GridSpace::new(4, 4), TdConfig::default())?;
//! let mut state = 0;
//! for _ in 0..100 {
//!     let action = solver.decide(&state)?;
//!     // Apply `action` to the environment...
//!     # let (next_state, reward) = (state, 0.0);
//!     solver.learn(reward)?;
//!     state = next_state;
//! }
//! # Ok(())
//! # }
//! ```
pub use rlsolve_candle_agent::{
    dqn::{DqnConfig, DqnSnapshot, DqnSolver},
    opt::OptimizerConfig,
};
pub use rlsolve_core::{
    config::SolverConfig, error::SolverError, record::Record, EnvSpace, GridSpace, Solver,
    TabularEnv,
};
pub use rlsolve_td_agent::{TdConfig, TdSolver, TdUpdate};
