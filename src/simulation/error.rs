//! Error types shared across the simulation.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A per-ray array does not have one entry per vision ray.
    #[error("`{field}` must have exactly {expected} entries, found {found}")]
    LengthMismatch {
        /// Offending parameter name.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        found: usize,
    },
    /// A `[min, max]` pair with `min > max`.
    #[error("`{field}` range is inverted: min {min} > max {max}")]
    InvertedRange {
        /// Offending parameter name.
        field: &'static str,
        /// Supplied lower bound.
        min: f64,
        /// Supplied upper bound.
        max: f64,
    },
    /// A value outside its admissible domain.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Errors raised by neural network construction and inference.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrainError {
    /// Inference received an input vector of the wrong length.
    #[error("network expects {expected} inputs, received {found}")]
    ShapeMismatch {
        /// Size of the input layer.
        expected: usize,
        /// Length of the supplied vector.
        found: usize,
    },
    /// A network needs at least an input and an output layer.
    #[error("network needs at least two layers, got {0}")]
    TooFewLayers(usize),
    /// A layer with no nodes.
    #[error("layer {0} has no nodes")]
    EmptyLayer(usize),
    /// A weight matrix that does not chain with its neighbours.
    #[error("weight matrix {index} has shape {found:?}, expected {expected:?}")]
    WeightShape {
        /// Layer transition index.
        index: usize,
        /// Required `(source + bias, destination)` shape.
        expected: (usize, usize),
        /// Actual shape.
        found: (usize, usize),
    },
    /// A weight that is not a finite value in `[-1, 1]`.
    #[error("weight matrix {0} holds a value outside [-1, 1]")]
    WeightOutOfRange(usize),
    /// A network whose layer sizes differ from the configured topology.
    #[error("runner {id} has layer sizes {found:?}, expected {expected:?}")]
    Topology {
        /// Id of the runner owning the network.
        id: u64,
        /// Layer sizes derived from the parameters.
        expected: Vec<usize>,
        /// Layer sizes of the network.
        found: Vec<usize>,
    },
}

/// Errors raised while driving the generational loop.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A network failed during a test run.
    #[error(transparent)]
    Brain(#[from] BrainError),
    /// `advance_generation` was called before `new_simulation`.
    #[error("simulation has not been started")]
    NotStarted,
}

/// Errors raised while reading or writing JSON files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON or a record that failed to deserialize.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Parameters inside the file are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The file parsed but its parts contradict each other.
    #[error("inconsistent record: {0}")]
    Inconsistent(String),
}
