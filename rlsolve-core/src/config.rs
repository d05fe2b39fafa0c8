//! Configuration surface of solvers.
//!
//! Solver configurations are plain `serde` structs. This module adds the
//! behavior they share: lookup of a hyperparameter by name, YAML round-trip
//! and validation before a solver is built from them.
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use serde_yaml::Value;
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of a solver.
pub trait SolverConfig: Serialize + DeserializeOwned + Sized {
    /// Checks the hyperparameters, returning
    /// [`SolverError::InvalidConfig`](crate::error::SolverError::InvalidConfig)
    /// for the first invalid one.
    fn validate(&self) -> Result<()>;

    /// Looks up a hyperparameter by its field name.
    ///
    /// ```rust
    /// # use rlsolve_core::config::SolverConfig;
    /// # use serde::{Deserialize, Serialize};
    /// #[derive(Serialize, Deserialize)]
    /// struct Opt { gamma: f64 }
    /// impl SolverConfig for Opt {
    ///     fn validate(&self) -> anyhow::Result<()> { Ok(()) }
    /// }
    ///
    /// let opt = Opt { gamma: 0.9 };
    /// assert_eq!(opt.get("gamma").and_then(|v| v.as_f64()), Some(0.9));
    /// assert!(opt.get("alpha").is_none());
    /// ```
    fn get(&self, name: &str) -> Option<Value> {
        match serde_yaml::to_value(self).ok()? {
            Value::Mapping(m) => m.get(&Value::String(name.to_string())).cloned(),
            _ => None,
        }
    }

    /// Constructs the configuration from a YAML file.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration as a YAML file.
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
