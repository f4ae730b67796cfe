//! Generational simulation of a runner population on one track.
//!
//! The population owns its parameters, track, runners and statistics. Each
//! generation is tested in parallel (test runs draw no randomness, so the
//! result does not depend on scheduling), ranked, recorded and culled.

use std::collections::HashSet;
use std::path::Path;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{BrainError, ConfigError, PersistenceError, SimulationError};
use super::evolution::{RunnerIds, rank, replace_dead, select_death_set};
use super::params::Params;
use super::runner::{Perception, Runner};
use super::stats::{GenerationSnapshot, PercentileSummary, SnapshotRank};
use super::track::Track;

/// Refers to a runner either in the live population or in a stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerRef {
    /// Position in the current ranking.
    Live(usize),
    /// Snapshot recorded for a past generation.
    Historical {
        /// Index into the snapshot history.
        generation: usize,
        /// Which of the stored runners.
        rank: SnapshotRank,
    },
}

/// A population of runners evolving on one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    params: Params,
    track: Track,
    runners: Vec<Runner>,
    death_set: Vec<usize>,
    generation: u32,
    ids: RunnerIds,
    fitness_history: Vec<PercentileSummary>,
    mutability_history: Vec<PercentileSummary>,
    snapshots: Vec<GenerationSnapshot>,
    retest_all: bool,
    #[serde(default)]
    tested_revision: u64,
}

/// Runs test runs for every runner accepted by `selected`.
fn test_runners(
    runners: &mut [Runner],
    selected: impl Fn(usize) -> bool + Sync,
    track: &Track,
    params: &Params,
    perception: &Perception,
) -> Result<(), BrainError> {
    if params.parallel_testing {
        runners
            .par_iter_mut()
            .enumerate()
            .filter(|(i, _)| selected(*i))
            .try_for_each(|(_, runner)| runner.test_run(track, params, perception).map(|_| ()))
    } else {
        runners
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| selected(*i))
            .try_for_each(|(_, runner)| runner.test_run(track, params, perception).map(|_| ()))
    }
}

impl Population {
    /// Creates an empty population. Call [`Population::new_simulation`] to
    /// create and test the founders.
    pub fn new(params: Params, track: Track) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            track,
            runners: Vec::new(),
            death_set: Vec::new(),
            generation: 0,
            ids: RunnerIds::new(),
            fitness_history: Vec::new(),
            mutability_history: Vec::new(),
            snapshots: Vec::new(),
            retest_all: false,
            tested_revision: 0,
        })
    }

    /// Discards all state and starts over with random founders.
    ///
    /// Founders get ids `0..n_runners`, are tested, ranked and recorded as
    /// generation zero, and the first death set is drawn.
    pub fn new_simulation<R: Rng>(&mut self, rng: &mut R) -> Result<(), SimulationError> {
        self.ids.reset();
        self.generation = 0;
        self.fitness_history.clear();
        self.mutability_history.clear();
        self.snapshots.clear();
        self.retest_all = false;

        self.runners = (0..self.params.n_runners)
            .map(|_| Runner::new_founder(self.ids.next_id(), &self.params, rng))
            .collect::<Result<_, _>>()?;

        let perception = Perception::default();
        let senses: Vec<&str> = perception.senses().iter().map(|s| s.name()).collect();
        debug!(count = self.runners.len(), ?senses, "founders created");

        test_runners(
            &mut self.runners,
            |_| true,
            &self.track,
            &self.params,
            &perception,
        )?;
        self.tested_revision = self.track.revision();
        rank(&mut self.runners);
        self.record_statistics();
        self.death_set = select_death_set(self.runners.len(), rng);
        self.log_generation();
        Ok(())
    }

    /// Breeds, tests, ranks and records the next generation.
    ///
    /// Only the new children are tested unless a full retest is pending
    /// (see [`Population::retest_pending`]), in which case every runner is
    /// tested once and the request is cleared.
    ///
    /// Every brain is checked against the configured topology first, so an
    /// error leaves the population untouched.
    pub fn advance_generation<R: Rng>(&mut self, rng: &mut R) -> Result<(), SimulationError> {
        if self.runners.is_empty() {
            return Err(SimulationError::NotStarted);
        }
        self.check_topology()?;

        let death_set = std::mem::take(&mut self.death_set);
        replace_dead(
            &mut self.runners,
            &death_set,
            self.generation + 1,
            &mut self.ids,
            &self.params,
            rng,
        );

        let retest_all = self.retest_pending();
        if retest_all {
            debug!(generation = self.generation + 1, "retesting every runner");
        }
        let children: HashSet<usize> = death_set.iter().copied().collect();
        test_runners(
            &mut self.runners,
            |i| retest_all || children.contains(&i),
            &self.track,
            &self.params,
            &Perception::default(),
        )?;
        self.retest_all = false;
        self.tested_revision = self.track.revision();

        rank(&mut self.runners);
        self.record_statistics();
        self.death_set = select_death_set(self.runners.len(), rng);
        self.generation += 1;
        self.log_generation();
        Ok(())
    }

    /// Requests that the next generation tests every runner, not only new ones.
    ///
    /// Needed after the track or the physics parameters change.
    pub fn force_retest(&mut self) {
        self.retest_all = true;
    }

    /// Whether the next generation will test every runner.
    ///
    /// True after [`Population::force_retest`] or [`Population::set_params`],
    /// and whenever the track has been edited since the last test round.
    pub fn retest_pending(&self) -> bool {
        self.retest_all || self.track.revision() != self.tested_revision
    }

    fn record_statistics(&mut self) {
        let fitness: Vec<f64> = self.runners.iter().map(|r| r.stored_fitness).collect();
        let mut mutability: Vec<f64> = self.runners.iter().map(Runner::mutability).collect();
        mutability.sort_by(|a, b| b.total_cmp(a));

        if let (Some(fit), Some(muta), Some(snapshot)) = (
            PercentileSummary::from_sorted(&fitness),
            PercentileSummary::from_sorted(&mutability),
            GenerationSnapshot::from_ranked(&self.runners),
        ) {
            self.fitness_history.push(fit);
            self.mutability_history.push(muta);
            self.snapshots.push(snapshot);
        }
    }

    fn log_generation(&self) {
        if let Some(fitness) = self.fitness_history.last() {
            info!(
                generation = self.generation,
                best = fitness.max(),
                median = fitness.median(),
                worst = fitness.min(),
                "generation ranked"
            );
        }
    }

    /// Parameters in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces the parameters.
    ///
    /// The network topology and population size must not change while
    /// runners exist, and the mutability range must still hold every live
    /// brain. A full retest is scheduled so fitness reflects the new values.
    pub fn set_params(&mut self, params: Params) -> Result<(), ConfigError> {
        params.validate()?;
        if !self.runners.is_empty() {
            if params.layer_sizes() != self.params.layer_sizes() {
                return Err(ConfigError::Invalid(
                    "network topology cannot change during a simulation",
                ));
            }
            if params.n_runners != self.params.n_runners {
                return Err(ConfigError::Invalid(
                    "population size cannot change during a simulation",
                ));
            }
            let range = params.min_mutability..=params.max_mutability;
            if self.runners.iter().any(|r| !range.contains(&r.mutability())) {
                return Err(ConfigError::Invalid(
                    "mutability range excludes a live runner",
                ));
            }
        }
        self.params = params;
        self.retest_all = true;
        Ok(())
    }

    /// The track runners are tested on.
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Mutable access to the track. Any edit bumps the track's revision,
    /// which schedules a full retest for the next generation.
    pub fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    /// Runners in rank order, best first.
    pub fn runners(&self) -> &[Runner] {
        &self.runners
    }

    /// Positions that will be replaced by the next generation.
    pub fn death_set(&self) -> &[usize] {
        &self.death_set
    }

    /// Number of completed generations after the founders.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Id that the next new runner will receive.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    /// Fitness summary per generation, oldest first.
    pub fn fitness_history(&self) -> &[PercentileSummary] {
        &self.fitness_history
    }

    /// Mutability summary per generation, oldest first.
    pub fn mutability_history(&self) -> &[PercentileSummary] {
        &self.mutability_history
    }

    /// Worst, median and best runner per generation, oldest first.
    pub fn snapshots(&self) -> &[GenerationSnapshot] {
        &self.snapshots
    }

    /// Resolves a live or historical runner.
    pub fn runner(&self, reference: RunnerRef) -> Option<&Runner> {
        match reference {
            RunnerRef::Live(index) => self.runners.get(index),
            RunnerRef::Historical { generation, rank } => {
                self.snapshots.get(generation).map(|s| s.get(rank))
            }
        }
    }

    /// Re-runs one runner's test on the current track and returns a copy
    /// holding its final state, for replay or inspection.
    pub fn replay(&self, reference: RunnerRef) -> Option<Result<Runner, BrainError>> {
        let mut runner = self.runner(reference)?.clone();
        let perception = Perception::default();
        Some(
            runner
                .test_run(&self.track, &self.params, &perception)
                .map(|_| runner),
        )
    }

    /// Fails if any live or snapshot brain differs from the configured topology.
    fn check_topology(&self) -> Result<(), BrainError> {
        let expected = self.params.layer_sizes();
        let snapshot_runners = self
            .snapshots
            .iter()
            .flat_map(|s| [&s.worst, &s.median, &s.best]);
        for runner in self.runners.iter().chain(snapshot_runners) {
            let found = runner.brain.layer_sizes();
            if found != expected {
                return Err(BrainError::Topology {
                    id: runner.id,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn check_consistency(&self) -> Result<(), PersistenceError> {
        self.params.validate()?;
        let inconsistent = |msg: String| Err(PersistenceError::Inconsistent(msg));

        if self.runners.is_empty() {
            return Ok(());
        }
        if self.runners.len() != self.params.n_runners {
            return inconsistent(format!(
                "{} runners stored for a population of {}",
                self.runners.len(),
                self.params.n_runners
            ));
        }
        let expected_deaths = self.runners.len() / 2;
        let distinct: HashSet<usize> = self.death_set.iter().copied().collect();
        if self.death_set.len() != expected_deaths
            || distinct.len() != expected_deaths
            || self.death_set.iter().any(|&i| i >= self.runners.len())
        {
            return inconsistent(format!(
                "death set must hold {expected_deaths} distinct positions below {}",
                self.runners.len()
            ));
        }

        let ids: HashSet<u64> = self.runners.iter().map(|r| r.id).collect();
        if ids.len() != self.runners.len() {
            return inconsistent("live runner ids are not unique".to_string());
        }
        let highest_id = self
            .runners
            .iter()
            .chain(self.snapshots.iter().flat_map(|s| [&s.worst, &s.median, &s.best]))
            .map(|r| r.id)
            .max();
        if let Some(highest) = highest_id {
            if self.ids.peek() <= highest {
                return inconsistent(format!(
                    "next id {} is not above stored id {highest}",
                    self.ids.peek()
                ));
            }
        }

        let entries = self.generation as usize + 1;
        if self.fitness_history.len() != entries
            || self.mutability_history.len() != entries
            || self.snapshots.len() != entries
        {
            return inconsistent(format!(
                "generation {} needs {entries} history entries, found {}/{}/{}",
                self.generation,
                self.fitness_history.len(),
                self.mutability_history.len(),
                self.snapshots.len()
            ));
        }

        let range = self.params.min_mutability..=self.params.max_mutability;
        if let Some(runner) = self.runners.iter().find(|r| !range.contains(&r.mutability())) {
            return inconsistent(format!(
                "runner {} has mutability {} outside {:?}",
                runner.id,
                runner.mutability(),
                range
            ));
        }

        if let Err(err) = self.check_topology() {
            return inconsistent(err.to_string());
        }
        Ok(())
    }

    /// Saves the population to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a population from a JSON file.
    ///
    /// The file is fully parsed and checked before anything is returned.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path)?;
        let population: Self = serde_json::from_str(&json)?;
        if let Err(err) = population.check_consistency() {
            warn!(%err, "rejected saved population");
            return Err(err);
        }
        Ok(population)
    }
}
