//! DQN solver.
mod base;
mod config;
mod explorer;
mod snapshot;
pub use base::DqnSolver;
pub use config::DqnConfig;
pub use explorer::EpsilonGreedy;
pub use snapshot::DqnSnapshot;
