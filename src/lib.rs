//! # Evo Track - Neuroevolution of Track Runners
//!
//! A population of circular runners learns to drive laps around a walled
//! track. Each runner is steered by a small feedforward neural network and
//! the population improves through a generational, mutation-only genetic
//! algorithm.
//!
//! ## Features
//!
//! - Feedforward networks with bias nodes and self-adapting mutability
//! - Ray-cast wall vision plus speed and heading senses
//! - Wall collisions that either kill or push back runners
//! - Directional scoring lines that reward laps and punish reversing
//! - Rank-biased death selection with parallel test runs
//! - Percentile statistics and best/median/worst snapshots per generation
//! - Track editing and JSON save/load of parameters, tracks and populations
//!
//! ## Core Modules
//!
//! - [`simulation::population`] - Generational loop and history
//! - [`simulation::runner`] - Runner physics and perception
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::track`] - Walls, scoring lines and editing
//! - [`simulation::evolution`] - Ranking, death selection and reproduction

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neural network implementation for runner brains.
    pub mod brain;
    /// Error types for configuration, inference, simulation and persistence.
    pub mod error;
    /// Ranking, death selection and reproduction.
    pub mod evolution;
    /// Geometric utility functions for distances and line intersections.
    pub mod geometric_utils;
    /// Simulation parameters.
    pub mod params;
    /// Generational simulation of a runner population.
    pub mod population;
    /// Runner behavior, state, and perception.
    pub mod runner;
    /// Directional scoring lines.
    pub mod scoring_line;
    /// Per-generation statistics.
    pub mod stats;
    /// Tracks: walls, scoring lines and start pose.
    pub mod track;
}
