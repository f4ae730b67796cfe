//! Fully connected layer with a bias node.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Squashing function applied to every non-input node.
///
/// Equal to `(1 / (1 + e^-x) - 0.5) * 2`, a logistic curve rescaled onto `(-1, 1)`.
#[inline]
pub fn squash(x: f64) -> f64 {
    (x * 0.5).tanh()
}

/// Connections from one layer (plus its bias node) to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    /// Weight matrix (`(input_size + 1)` × `output_size`); the last row holds
    /// the bias node's weights. Every entry lies in `[-1, 1]`.
    pub weights: Array2<f64>,
}

impl Mlp {
    /// Creates a layer with every weight set to zero.
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weights: Array2::zeros((input_size + 1, output_size)),
        }
    }

    /// Number of source nodes, not counting the bias node.
    pub fn input_size(&self) -> usize {
        self.weights.nrows().saturating_sub(1)
    }

    /// Number of destination nodes.
    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Performs a forward pass. `inputs` must already end with the bias value.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f64>) -> Array1<f64> {
        let mut output = self.weights.t().dot(inputs);
        output.mapv_inplace(squash);
        output
    }

    /// Perturbs every weight by `(u - 0.5) * mutability` and clamps to `[-1, 1]`.
    pub fn mutate<R: Rng>(&mut self, mutability: f64, rng: &mut R) {
        self.weights
            .mapv_inplace(|w| (w + (rng.random::<f64>() - 0.5) * mutability).clamp(-1.0, 1.0));
    }
}
