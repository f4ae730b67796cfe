//! Runner state, per-tick behaviour and test runs.
//!
//! Runners sense the walls around them, let their brain choose a speed and
//! heading change, move, and collect fitness for speed, wall clearance and
//! crossed scoring lines.

use geo::Coord;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::super::brain::Brain;
use super::super::error::BrainError;
use super::super::geometric_utils::{heading_vector, normalize_degrees};
use super::super::params::Params;
use super::super::track::Track;
use super::perception::Perception;

fn origin() -> Coord<f64> {
    Coord { x: 0.0, y: 0.0 }
}

fn alive() -> bool {
    true
}

/// A track-running agent steered by a neural network.
///
/// Only identity, lineage, the last test result and the brain are persisted;
/// the kinematic state belongs to the current test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// Unique id within a simulation.
    pub id: u64,
    /// Id of the runner this one was mutated from; `None` for founders.
    pub parent_id: Option<u64>,
    /// Generation in which this runner was created.
    pub birth_generation: u32,
    /// Fitness at the end of the most recent test run.
    pub stored_fitness: f64,
    /// Steering network.
    pub brain: Brain,
    /// Position of the circle's center.
    #[serde(skip, default = "origin")]
    pub pos: Coord<f64>,
    /// Position at the start of the current tick.
    #[serde(skip, default = "origin")]
    pub last_pos: Coord<f64>,
    /// Signed speed along the heading.
    #[serde(skip)]
    pub speed: f64,
    /// Heading in degrees, `[0, 360)`.
    #[serde(skip)]
    pub angle: f64,
    /// Fitness accumulated during the current test run.
    #[serde(skip)]
    pub current_fitness: f64,
    /// Dead runners ignore further ticks.
    #[serde(skip, default = "alive")]
    pub alive: bool,
}

impl Runner {
    /// Creates a runner around an existing brain.
    pub fn with_brain(id: u64, brain: Brain) -> Self {
        Self {
            id,
            parent_id: None,
            birth_generation: 0,
            stored_fitness: 0.0,
            brain,
            pos: origin(),
            last_pos: origin(),
            speed: 0.0,
            angle: 0.0,
            current_fitness: 0.0,
            alive: true,
        }
    }

    /// Creates a founder with a random brain shaped by `params`.
    pub fn new_founder<R: Rng>(id: u64, params: &Params, rng: &mut R) -> Result<Self, BrainError> {
        let brain = Brain::new_random(&params.layer_sizes(), params, rng)?;
        Ok(Self::with_brain(id, brain))
    }

    /// Creates a mutated copy of this runner.
    ///
    /// # Arguments
    ///
    /// * `id` - Fresh id for the child
    /// * `birth_generation` - Generation the child belongs to
    /// * `params` - Mutation bounds
    /// * `rng` - Source of mutation noise
    pub fn offspring<R: Rng>(
        &self,
        id: u64,
        birth_generation: u32,
        params: &Params,
        rng: &mut R,
    ) -> Self {
        let brain = self.brain.mutated(params, rng);
        Self {
            parent_id: Some(self.id),
            birth_generation,
            ..Self::with_brain(id, brain)
        }
    }

    /// Resets the runner for a fresh test run at the given pose.
    pub fn place(&mut self, start: Coord<f64>, angle: f64) {
        self.pos = start;
        self.last_pos = start;
        self.angle = normalize_degrees(angle);
        self.speed = 0.0;
        self.current_fitness = 0.0;
        self.alive = true;
    }

    /// Returns true if the runner still reacts to ticks.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Kills the runner.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Sets the speed, clamped to the configured range.
    pub fn set_speed(&mut self, speed: f64, params: &Params) {
        self.speed = speed.clamp(params.min_speed, params.max_speed);
    }

    /// Mutability of this runner's brain.
    pub fn mutability(&self) -> f64 {
        self.brain.mutability()
    }

    /// Senses, decides, moves and earns the per-tick fitness.
    ///
    /// Does not check walls or scoring lines; see [`Runner::tick`].
    pub fn step(
        &mut self,
        track: &Track,
        params: &Params,
        perception: &Perception,
    ) -> Result<(), BrainError> {
        if !self.alive {
            return Ok(());
        }
        self.last_pos = self.pos;

        let inputs = perception.perceive(self, track, params);
        let outputs = self.brain.infer(&inputs)?;

        self.set_speed(self.speed + params.speed_change * outputs[0], params);
        self.angle = normalize_degrees(self.angle + params.angle_change * outputs[1]);
        self.pos = self.pos + heading_vector(self.angle) * self.speed;

        let mut gain = params.fitness_base_gain;
        if params.fitness_speed {
            gain *= (self.speed.abs() / params.max_speed).powf(std::f64::consts::E);
        }
        if params.fitness_wall {
            let total: f64 = params.vision_weights.iter().sum();
            let weighted: f64 = inputs
                .iter()
                .zip(&params.vision_weights)
                .map(|(input, weight)| input * weight)
                .sum();
            gain *= weighted / total;
        }
        self.current_fitness += gain;
        Ok(())
    }

    /// Advances one tick: [`Runner::step`], then wall collision, then scoring lines.
    pub fn tick(
        &mut self,
        track: &Track,
        params: &Params,
        perception: &Perception,
    ) -> Result<(), BrainError> {
        if !self.alive {
            return Ok(());
        }
        self.step(track, params, perception)?;
        track.collide(self, params);
        track.score_lines(self, params);
        Ok(())
    }

    /// Runs a full test on `track` and stores the resulting fitness.
    ///
    /// # Returns
    ///
    /// The fitness earned, also written to `stored_fitness`.
    pub fn test_run(
        &mut self,
        track: &Track,
        params: &Params,
        perception: &Perception,
    ) -> Result<f64, BrainError> {
        track.enter(self);
        for _ in 0..params.test_ticks {
            if !self.alive {
                break;
            }
            self.tick(track, params, perception)?;
        }
        self.stored_fitness = self.current_fitness;
        Ok(self.stored_fitness)
    }
}
