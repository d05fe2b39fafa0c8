//! Utilities.
mod named_tensors;
pub use named_tensors::{NamedTensors, TensorData};
