//! Multilayer perceptron.
mod base;
mod config;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

/// Applies the layers with ReLU between them and no activation on the output.
fn mlp_forward(xs: Tensor, layers: &[Linear]) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for layer in layers.iter().take(n_layers - 1) {
        xs = layer.forward(&xs)?.relu()?;
    }

    Ok(layers[n_layers - 1].forward(&xs)?)
}
