#![warn(missing_docs)]
//! Core components of rlsolve.
//!
//! This crate defines the contract shared by all solvers ([`Solver`]), the
//! capability an environment exposes to them ([`EnvSpace`], [`TabularEnv`]),
//! and the memory structures used while learning ([`Sarsa`], [`ReplayMemory`]).
pub mod config;
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{EnvSpace, Solver, TabularEnv};

mod grid;
pub use grid::GridSpace;

mod memory;
pub use memory::{Sarsa, Transition};

mod replay_memory;
pub use replay_memory::ReplayMemory;
