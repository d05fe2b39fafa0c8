use crate::util::NamedTensors;
use serde::{Deserialize, Serialize};

/// Serializable state of a [`DqnSolver`](super::DqnSolver).
///
/// It holds what is needed to make decisions: the sizes of the network and
/// its parameters. Replay memory and learning counters are not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnSnapshot {
    /// Input size of the network.
    pub number_of_states: usize,

    /// Widths of the hidden layers.
    pub number_of_hidden_units: Vec<usize>,

    /// Output size of the network.
    pub number_of_actions: usize,

    /// Parameters of the network.
    pub network: NamedTensors,
}
