use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use rlsolve_core::error::SolverError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape and values of a tensor, stored on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    /// Dimensions.
    pub shape: Vec<usize>,

    /// Values in row-major order.
    pub data: Vec<f32>,
}

/// Named tensors, the serializable form of the parameters in a [`VarMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTensors {
    /// Parameters keyed by variable name.
    pub named_tensors: BTreeMap<String, TensorData>,
}

impl NamedTensors {
    /// Copies the data of a [`VarMap`] to the host.
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let src = vs.data().lock().map_err(|e| anyhow!("{}", e))?;
        let mut named_tensors = BTreeMap::new();

        for (name, var) in src.iter() {
            let t = var.as_tensor().detach();
            named_tensors.insert(
                name.clone(),
                TensorData {
                    shape: t.dims().to_vec(),
                    data: t.flatten_all()?.to_vec1::<f32>()?,
                },
            );
        }

        Ok(Self { named_tensors })
    }

    /// Copies the named tensors into the variables of a [`VarMap`].
    ///
    /// The names and shapes must be the same as the variables in `vs`,
    /// otherwise [`SolverError::SnapshotMismatch`] is returned. Nothing is
    /// written in that case.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let dest = vs.data().lock().map_err(|e| anyhow!("{}", e))?;

        if dest.len() != self.named_tensors.len() {
            return Err(SolverError::SnapshotMismatch(format!(
                "{} tensors given for {} variables",
                self.named_tensors.len(),
                dest.len()
            ))
            .into());
        }

        let mut tensors = Vec::with_capacity(dest.len());
        for (name, var) in dest.iter() {
            let src = self
                .named_tensors
                .get(name)
                .ok_or_else(|| SolverError::SnapshotMismatch(format!("missing tensor {}", name)))?;
            if src.shape != var.dims() || src.data.len() != var.elem_count() {
                return Err(SolverError::SnapshotMismatch(format!(
                    "tensor {} has shape {:?}, expected {:?}",
                    name,
                    src.shape,
                    var.dims()
                ))
                .into());
            }
            let t = Tensor::from_slice(&src.data, src.shape.as_slice(), var.device())?;
            tensors.push((var, t));
        }

        for (var, t) in tensors {
            var.set(&t)?;
        }

        Ok(())
    }
}
