//! Vision sense - lets runners see the walls around them.

use ndarray::Array1;

use super::super::geometric_utils::normalize_degrees;
use super::super::params::Params;
use super::super::track::Track;
use super::Runner;
use super::sense::Sense;

/// Vision sense that casts one ray per configured vision angle.
///
/// Each output is the free distance to the nearest wall along the ray (the
/// hit distance minus the runner radius, floored at zero and capped at the
/// view distance), divided by the view distance. Rays that hit nothing read
/// `1.0`.
pub struct Vision;

impl Vision {
    /// Creates a new vision sense.
    pub fn new() -> Self {
        Self
    }
}

impl Default for Vision {
    fn default() -> Self {
        Self::new()
    }
}

impl Sense for Vision {
    fn sense(&self, runner: &Runner, track: &Track, params: &Params) -> Array1<f64> {
        let view = params.max_view_distance;
        let reach = view + params.runner_radius;
        params
            .vision_angles
            .iter()
            .map(|&offset| {
                let angle = normalize_degrees(runner.angle + offset);
                let free = track
                    .ray_distance(runner.pos, angle, reach)
                    .map_or(view, |hit| (hit - params.runner_radius).clamp(0.0, view));
                free / view
            })
            .collect()
    }

    fn input_size(&self, params: &Params) -> usize {
        params.vision_angles.len()
    }

    fn name(&self) -> &str {
        "vision"
    }
}
