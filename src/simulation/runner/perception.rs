//! Perception system that combines multiple senses into brain inputs.

use ndarray::{Array1, s};

use super::super::params::Params;
use super::super::track::Track;
use super::Runner;
use super::sense::Sense;

/// Manages multiple senses and concatenates their outputs, in order, into a
/// single input vector for the runner's brain.
pub struct Perception {
    /// Ordered list of senses that contribute to perception
    senses: Vec<Box<dyn Sense>>,
}

impl Perception {
    /// Creates a new perception system that will query senses in the order given.
    pub fn new(senses: Vec<Box<dyn Sense>>) -> Self {
        Self { senses }
    }

    /// Process all senses and return combined brain inputs.
    ///
    /// # Arguments
    ///
    /// * `runner` - The runner doing the sensing
    /// * `track` - The track it is driving on
    /// * `params` - Simulation parameters
    ///
    /// # Returns
    ///
    /// A 1D array containing all sensory activations concatenated in order.
    pub fn perceive(&self, runner: &Runner, track: &Track, params: &Params) -> Array1<f64> {
        let mut combined_inputs = Array1::zeros(self.total_input_size(params));

        let mut offset = 0;
        for sense in &self.senses {
            let sense_size = sense.input_size(params);
            let sense_outputs = sense.sense(runner, track, params);
            combined_inputs
                .slice_mut(s![offset..offset + sense_size])
                .assign(&sense_outputs);
            offset += sense_size;
        }

        combined_inputs
    }

    /// Returns the total number of brain inputs produced by all senses.
    pub fn total_input_size(&self, params: &Params) -> usize {
        self.senses.iter().map(|s| s.input_size(params)).sum()
    }

    /// Returns a reference to the senses in this perception system.
    pub fn senses(&self) -> &[Box<dyn Sense>] {
        &self.senses
    }
}

impl Default for Perception {
    fn default() -> Self {
        use super::proprioception::Proprioception;
        use super::vision::Vision;

        Self::new(vec![Box::new(Vision::new()), Box::new(Proprioception::new())])
    }
}
