//! Records of learning steps.
//!
//! A [`Record`] is a small key-value container returned by
//! [`Solver::learn_with_record`](crate::Solver::learn_with_record), carrying
//! quantities like the loss or the current exploration rate of a step.
use crate::error::SolverError;
use std::collections::HashMap;

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like the loss.
    Scalar(f32),

    /// A 1-dimensional array of floating-point values, like action values.
    Array1(Vec<f32>),
}

/// A container for storing key-value pairs of learning quantities.
///
/// ```rust
/// use rlsolve_core::record::{Record, RecordValue};
///
/// let mut record = Record::empty();
/// record.insert("loss", RecordValue::Scalar(0.5));
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, SolverError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(SolverError::RecordValueTypeError("Scalar".to_string())),
            None => Err(SolverError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, SolverError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(SolverError::RecordValueTypeError("Array1".to_string())),
            None => Err(SolverError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
