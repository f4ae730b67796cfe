//! Abstract sense trait for runner perception.
//!
//! Senses collect information from the track and the runner's own state and
//! convert it into neural network inputs.

use ndarray::Array1;

use super::super::params::Params;
use super::super::track::Track;
use super::Runner;

/// Trait for different sensory modalities that runners can use to perceive their surroundings.
///
/// Each sense returns a vector of activations that will be fed as inputs to
/// the runner's brain.
pub trait Sense: Sync {
    /// Process sensory information and return neural network inputs.
    ///
    /// # Arguments
    ///
    /// * `runner` - The runner doing the sensing
    /// * `track` - The track it is driving on
    /// * `params` - Simulation parameters
    ///
    /// # Returns
    ///
    /// A 1D array of sensory activations to be used as brain inputs.
    fn sense(&self, runner: &Runner, track: &Track, params: &Params) -> Array1<f64>;

    /// Returns the number of neural network inputs this sense produces.
    fn input_size(&self, params: &Params) -> usize;

    /// Returns a human-readable name for this sense.
    fn name(&self) -> &str;
}
