//! Proprioception sense - runner's awareness of its own motion.

use ndarray::{Array1, array};

use super::super::params::Params;
use super::super::track::Track;
use super::Runner;
use super::sense::Sense;

/// Maps a heading in `[0, 360)` onto `[-1, 1]`.
///
/// `0°` and `360°` both map to `-1` and `180°` maps to `1`, so the signal is
/// continuous where the heading wraps around.
pub fn heading_signal(angle: f64) -> f64 {
    let t = angle / 180.0 - 1.0;
    2.0 * (1.0 - t * t).max(0.0).sqrt() - 1.0
}

/// Proprioception sense for speed and heading.
///
/// Outputs:
/// - Speed divided by the largest absolute speed limit
/// - Heading, via [`heading_signal`]
pub struct Proprioception;

impl Proprioception {
    /// Creates a new proprioception sense.
    pub fn new() -> Self {
        Self
    }
}

impl Default for Proprioception {
    fn default() -> Self {
        Self::new()
    }
}

impl Sense for Proprioception {
    fn sense(&self, runner: &Runner, _track: &Track, params: &Params) -> Array1<f64> {
        array![
            runner.speed / params.speed_norm(),
            heading_signal(runner.angle)
        ]
    }

    fn input_size(&self, _params: &Params) -> usize {
        2
    }

    fn name(&self) -> &str {
        "proprioception"
    }
}
