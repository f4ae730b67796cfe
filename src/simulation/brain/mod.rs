//! Neural network implementation for runner brains.
//!
//! A fixed-topology feedforward network. Every layer except the output layer
//! carries a constant bias node whose value is always `1.0`. Networks evolve
//! by mutation only: each copy drifts its own mutability and then perturbs
//! its weights by an amount proportional to it.

use ndarray::{Array1, ArrayView1, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::BrainError;
use super::params::Params;

pub mod mlp;

pub use mlp::{Mlp, squash};

/// Neural network that maps a runner's senses to speed and turn commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BrainRecord", into = "BrainRecord")]
pub struct Brain {
    layers: Vec<Mlp>,
    mutability: f64,
    node_values: Vec<Array1<f64>>,
}

/// Serialized form of a [`Brain`]; node activations are not persisted.
#[derive(Serialize, Deserialize)]
struct BrainRecord {
    layers: Vec<Mlp>,
    mutability: f64,
}

impl TryFrom<BrainRecord> for Brain {
    type Error = BrainError;

    fn try_from(record: BrainRecord) -> Result<Self, Self::Error> {
        Self::from_layers(record.layers, record.mutability)
    }
}

impl From<Brain> for BrainRecord {
    fn from(brain: Brain) -> Self {
        Self {
            layers: brain.layers,
            mutability: brain.mutability,
        }
    }
}

fn check_layer_sizes(layer_sizes: &[usize]) -> Result<(), BrainError> {
    if layer_sizes.len() < 2 {
        return Err(BrainError::TooFewLayers(layer_sizes.len()));
    }
    match layer_sizes.iter().position(|&size| size == 0) {
        Some(index) => Err(BrainError::EmptyLayer(index)),
        None => Ok(()),
    }
}

/// Copies `values` and appends the bias node.
fn with_bias(values: ArrayView1<f64>) -> Array1<f64> {
    let mut biased = Array1::ones(values.len() + 1);
    biased.slice_mut(s![..values.len()]).assign(&values);
    biased
}

impl Brain {
    /// Creates a brain with uniform random weights in `[-1, 1]` and a
    /// mutability drawn uniformly from the configured range.
    pub fn new_random<R: Rng>(
        layer_sizes: &[usize],
        params: &Params,
        rng: &mut R,
    ) -> Result<Self, BrainError> {
        let mutability = params.min_mutability
            + rng.random::<f64>() * (params.max_mutability - params.min_mutability);
        let mut brain = Self::new_zeroed(layer_sizes, mutability)?;
        brain.randomize_weights(rng);
        Ok(brain)
    }

    /// Creates a brain with every weight set to zero. Its outputs are always zero.
    pub fn new_zeroed(layer_sizes: &[usize], mutability: f64) -> Result<Self, BrainError> {
        check_layer_sizes(layer_sizes)?;
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Mlp::zeros(pair[0], pair[1]))
            .collect();
        Ok(Self {
            layers,
            mutability,
            node_values: Vec::new(),
        })
    }

    /// Builds a brain from explicit weight matrices.
    ///
    /// # Arguments
    ///
    /// * `layers` - Consecutive layers; each must accept the previous layer's
    ///   outputs plus a bias node
    /// * `mutability` - Mutation scale carried by this brain
    ///
    /// # Returns
    ///
    /// The brain, or an error if the matrices do not chain or hold weights
    /// outside `[-1, 1]`.
    pub fn from_layers(layers: Vec<Mlp>, mutability: f64) -> Result<Self, BrainError> {
        if layers.is_empty() {
            return Err(BrainError::TooFewLayers(0));
        }
        for (index, layer) in layers.iter().enumerate() {
            if layer.input_size() == 0 {
                return Err(BrainError::EmptyLayer(index));
            }
            if layer.output_size() == 0 {
                return Err(BrainError::EmptyLayer(index + 1));
            }
            if index > 0 {
                let expected = (layers[index - 1].output_size() + 1, layer.output_size());
                if layer.weights.dim() != expected {
                    return Err(BrainError::WeightShape {
                        index,
                        expected,
                        found: layer.weights.dim(),
                    });
                }
            }
            if layer
                .weights
                .iter()
                .any(|w| !w.is_finite() || w.abs() > 1.0)
            {
                return Err(BrainError::WeightOutOfRange(index));
            }
        }
        Ok(Self {
            layers,
            mutability,
            node_values: Vec::new(),
        })
    }

    /// Node counts per layer, excluding bias nodes.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        sizes.push(self.input_size());
        sizes.extend(self.layers.iter().map(Mlp::output_size));
        sizes
    }

    /// Number of inputs [`Brain::infer`] expects.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Mlp::input_size)
    }

    /// Number of outputs [`Brain::infer`] returns.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Mlp::output_size)
    }

    /// Weight matrices from input to output.
    pub fn layers(&self) -> &[Mlp] {
        &self.layers
    }

    /// Current mutation scale.
    pub fn mutability(&self) -> f64 {
        self.mutability
    }

    /// Activations from the most recent inference, one array per layer.
    ///
    /// Every layer except the last ends with its bias node. Empty before the
    /// first inference.
    pub fn node_values(&self) -> &[Array1<f64>] {
        &self.node_values
    }

    /// Runs a forward pass and records every layer's activations.
    ///
    /// # Arguments
    ///
    /// * `inputs` - One value per input node
    ///
    /// # Returns
    ///
    /// Output activations, each in `[-1, 1]`, or a shape mismatch error.
    pub fn infer(&mut self, inputs: &Array1<f64>) -> Result<Array1<f64>, BrainError> {
        let expected = self.input_size();
        if inputs.len() != expected {
            return Err(BrainError::ShapeMismatch {
                expected,
                found: inputs.len(),
            });
        }

        self.node_values.clear();
        let last = self.layers.len() - 1;
        let mut values = with_bias(inputs.view());
        for (index, layer) in self.layers.iter().enumerate() {
            let output = layer.forward(&values);
            let next = if index < last {
                with_bias(output.view())
            } else {
                output
            };
            self.node_values.push(std::mem::replace(&mut values, next));
        }
        self.node_values.push(values.clone());
        Ok(values)
    }

    /// Redraws every weight uniformly from `[-1, 1]`.
    pub fn randomize_weights<R: Rng>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.weights.mapv_inplace(|_| rng.random_range(-1.0..=1.0));
        }
    }

    /// Returns a mutated copy, leaving this brain untouched.
    pub fn mutated<R: Rng>(&self, params: &Params, rng: &mut R) -> Self {
        let mut child = self.clone();
        child.mutate(params, rng);
        child
    }

    /// Mutates this brain in place.
    ///
    /// Mutability first drifts by `(u - 0.5) * mutability_change` and is
    /// clamped to its configured range; every weight then moves by
    /// `(u - 0.5) * mutability` and is clamped to `[-1, 1]`.
    pub fn mutate<R: Rng>(&mut self, params: &Params, rng: &mut R) {
        self.mutability = (self.mutability
            + (rng.random::<f64>() - 0.5) * params.mutability_change)
            .clamp(params.min_mutability, params.max_mutability);
        let mutability = self.mutability;
        for layer in &mut self.layers {
            layer.mutate(mutability, rng);
        }
    }
}
