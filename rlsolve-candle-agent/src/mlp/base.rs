use super::{mlp_forward, MlpConfig};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, VarBuilder, VarMap};
use log::trace;
use rand::Rng;

fn layer_name(i: usize) -> String {
    format!("mlp.ln{}", i)
}

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let vs = vs.pp("mlp");

    let layers = config
        .in_out_pairs()
        .iter()
        .enumerate()
        .map(|(i, &(in_dim, out_dim))| linear(in_dim, out_dim, vs.pp(format!("ln{}", i))))
        .collect::<candle_core::Result<Vec<_>>>()?;

    Ok(layers)
}

/// Multilayer perceptron with ReLU activation function.
///
/// The parameters are owned by a [`VarMap`]; they are initialized uniformly in
/// `[-1/sqrt(in_dim), 1/sqrt(in_dim))` with values drawn from the given random
/// number generator, so a seeded generator gives a reproducible network.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    varmap: VarMap,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Constructs MLP.
    pub fn build<R: Rng>(config: MlpConfig, device: &Device, rng: &mut R) -> Result<Self> {
        if config.units.is_empty() {
            return Err(anyhow!("MLP needs at least one hidden layer"));
        }

        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let layers = create_linear_layers(vs, &config)?;

        {
            let data = varmap.data().lock().map_err(|e| anyhow!("{}", e))?;
            for (i, (in_dim, out_dim)) in config.in_out_pairs().into_iter().enumerate() {
                let bound = 1.0 / (in_dim as f32).sqrt();
                for (suffix, shape) in [("weight", vec![out_dim, in_dim]), ("bias", vec![out_dim])] {
                    let name = format!("{}.{}", layer_name(i), suffix);
                    let var = data
                        .get(&name)
                        .ok_or_else(|| anyhow!("Parameter {} not found", name))?;
                    let n = shape.iter().product::<usize>();
                    let values = (0..n)
                        .map(|_| rng.gen_range(-bound..bound))
                        .collect::<Vec<f32>>();
                    var.set(&Tensor::from_vec(values, shape, device)?)?;
                }
            }
        }
        trace!("Built MLP {:?}", config);

        Ok(Self {
            config,
            device: device.clone(),
            varmap,
            layers,
        })
    }

    /// Forward pass for a single input vector, returns a `(1, out_dim)` tensor.
    ///
    /// The output stays connected to the parameters, so gradients can be
    /// computed from it.
    pub fn forward(&self, xs: &[f32]) -> Result<Tensor> {
        let xs = Tensor::from_slice(xs, (1, self.config.in_dim), &self.device)?;
        mlp_forward(xs, &self.layers)
    }

    /// Output values for a single input vector, without gradient tracking.
    pub fn forward_values(&self, xs: &[f32]) -> Result<Vec<f32>> {
        Ok(self.forward(xs)?.detach().flatten_all()?.to_vec1::<f32>()?)
    }

    /// Parameters of the network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}

#[cfg(test)]
mod tests {
    use super::{Mlp, MlpConfig};
    use anyhow::Result;
    use candle_core::Device;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_parameter_names_and_shapes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let mlp = Mlp::build(MlpConfig::new(3, vec![8, 4], 2), &Device::Cpu, &mut rng)?;
        let data = mlp.varmap().data().lock().unwrap();

        assert_eq!(data.len(), 6);
        assert_eq!(data.get("mlp.ln0.weight").unwrap().dims(), &[8, 3]);
        assert_eq!(data.get("mlp.ln1.bias").unwrap().dims(), &[4]);
        assert_eq!(data.get("mlp.ln2.weight").unwrap().dims(), &[2, 4]);
        Ok(())
    }

    #[test]
    fn test_same_seed_gives_same_network() -> Result<()> {
        let config = MlpConfig::new(4, vec![16], 3);
        let xs = [0.5, -1.0, 0.0, 2.0];
        let build = |seed| Mlp::build(config.clone(), &Device::Cpu, &mut StdRng::seed_from_u64(seed));

        let y1 = build(1)?.forward_values(&xs)?;
        let y2 = build(1)?.forward_values(&xs)?;
        let y3 = build(2)?.forward_values(&xs)?;
        assert_eq!(y1.len(), 3);
        assert_eq!(y1, y2);
        assert_ne!(y1, y3);
        Ok(())
    }

    #[test]
    fn test_input_size_is_checked() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let mlp = Mlp::build(MlpConfig::new(2, vec![4], 2), &Device::Cpu, &mut rng)?;
        assert!(mlp.forward(&[1.0, 2.0, 3.0]).is_err());
        assert!(Mlp::build(MlpConfig::new(2, vec![], 2), &Device::Cpu, &mut rng).is_err());
        Ok(())
    }
}
