//! Simulation parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, PersistenceError};

/// Number of wall-distance rays every runner casts.
pub const VISION_RAYS: usize = 8;
/// Inputs fed to a runner's network: one per ray, plus speed and heading.
pub const INPUT_SIZE: usize = VISION_RAYS + 2;
/// Outputs read from a runner's network: speed delta and turn delta.
pub const OUTPUT_SIZE: usize = 2;

/// Parameters that control the physics, fitness and evolution of runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Population size, constant across generations.
    pub n_runners: usize,
    /// Whether crossing a scoring line in the right direction awards fitness.
    /// Crossing in the wrong direction is penalized either way.
    pub fitness_lines_give: bool,
    /// Maximum speed change per tick, scaled by the first network output.
    pub speed_change: f64,
    /// Maximum heading change per tick in degrees, scaled by the second output.
    pub angle_change: f64,
    /// Lowest allowed speed (negative values drive backwards).
    pub min_speed: f64,
    /// Highest allowed speed.
    pub max_speed: f64,
    /// Runner collision radius.
    pub runner_radius: f64,
    /// Kill runners on wall contact instead of pushing them back.
    pub kill_on_collision: bool,
    /// Ticks per test run.
    pub test_ticks: usize,
    /// Rays report distances up to this far (after subtracting the radius).
    pub max_view_distance: f64,
    /// Fitness per scoring line crossing.
    pub fitness_gain: f64,
    /// Fitness earned per tick before the speed and wall terms are applied.
    pub fitness_base_gain: f64,
    /// Scale per-tick fitness by normalized speed.
    pub fitness_speed: bool,
    /// Scale per-tick fitness by the weighted average wall distance.
    pub fitness_wall: bool,
    /// Weight of each ray in the wall term.
    pub vision_weights: Vec<f64>,
    /// Ray directions in degrees, relative to the runner heading.
    pub vision_angles: Vec<f64>,
    /// Hidden layer widths.
    pub hidden_layers: Vec<usize>,
    /// Upper bound for a network's mutability.
    pub max_mutability: f64,
    /// Lower bound for a network's mutability.
    pub min_mutability: f64,
    /// Maximum mutability drift per generation.
    pub mutability_change: f64,
    /// Seed for reproducible runs; a random seed is drawn when absent.
    pub rng_seed: Option<u64>,
    /// Run test runs on the rayon thread pool.
    pub parallel_testing: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n_runners: 500,
            fitness_lines_give: true,
            speed_change: 0.01,
            angle_change: 10.0,
            min_speed: -10.0,
            max_speed: 20.0,
            runner_radius: 20.0,
            kill_on_collision: true,
            test_ticks: 2000,
            max_view_distance: 600.0,
            fitness_gain: 1.0,
            fitness_base_gain: 0.01,
            fitness_speed: true,
            fitness_wall: true,
            vision_weights: vec![4.0, 3.0, 2.0, 1.0, 2.0, 1.0, 2.0, 3.0],
            vision_angles: vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0],
            hidden_layers: vec![6],
            max_mutability: 4.0,
            min_mutability: -4.0,
            mutability_change: 1.0,
            rng_seed: None,
            parallel_testing: true,
        }
    }
}

impl Params {
    /// Layer widths of every runner network: inputs, hidden layers, outputs.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(INPUT_SIZE);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(OUTPUT_SIZE);
        sizes
    }

    /// Largest absolute speed, used to normalize the speed input.
    pub fn speed_norm(&self) -> f64 {
        self.max_speed.abs().max(self.min_speed.abs())
    }

    /// Checks that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, found) in [
            ("vision_angles", self.vision_angles.len()),
            ("vision_weights", self.vision_weights.len()),
        ] {
            if found != VISION_RAYS {
                return Err(ConfigError::LengthMismatch {
                    field,
                    expected: VISION_RAYS,
                    found,
                });
            }
        }

        let scalars = [
            self.speed_change,
            self.angle_change,
            self.min_speed,
            self.max_speed,
            self.runner_radius,
            self.max_view_distance,
            self.fitness_gain,
            self.fitness_base_gain,
            self.max_mutability,
            self.min_mutability,
            self.mutability_change,
        ];
        if scalars
            .iter()
            .chain(&self.vision_weights)
            .chain(&self.vision_angles)
            .any(|v| !v.is_finite())
        {
            return Err(ConfigError::Invalid("all numeric parameters must be finite"));
        }

        if self.min_speed > self.max_speed {
            return Err(ConfigError::InvertedRange {
                field: "speed",
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.min_mutability > self.max_mutability {
            return Err(ConfigError::InvertedRange {
                field: "mutability",
                min: self.min_mutability,
                max: self.max_mutability,
            });
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::Invalid("max_speed must be positive"));
        }
        if self.max_view_distance <= 0.0 {
            return Err(ConfigError::Invalid("max_view_distance must be positive"));
        }
        if self.runner_radius < 0.0 {
            return Err(ConfigError::Invalid("runner_radius must not be negative"));
        }
        if self.n_runners < 2 {
            return Err(ConfigError::Invalid("n_runners must be at least 2"));
        }
        if self.hidden_layers.contains(&0) {
            return Err(ConfigError::Invalid("hidden layers must have at least one node"));
        }
        if self.fitness_wall && self.vision_weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid(
                "vision weights must sum to a positive value when fitness_wall is set",
            ));
        }
        Ok(())
    }

    /// Saves parameters to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads and validates parameters from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
