//! Selection and reproduction for the generational loop.
//!
//! A generation is ranked by fitness, roughly the worse half is chosen to
//! die with a bias towards low ranks, and every dead slot is refilled with a
//! mutated copy of a survivor.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::params::Params;
use super::runner::Runner;

/// Hands out runner ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerIds {
    next: u64,
}

impl RunnerIds {
    /// Creates a generator whose first id is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id and advances the counter.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`RunnerIds::next_id`] will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Restarts numbering from `0`.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Sorts runners by stored fitness, best first. Ties keep their order.
pub fn rank(runners: &mut [Runner]) {
    runners.sort_by(|a, b| b.stored_fitness.total_cmp(&a.stored_fitness));
}

/// Picks which ranked positions die.
///
/// Starting from every position `0..population`, survivors are drawn one at
/// a time at index `floor(u^3 * remaining)` until `population - population / 2`
/// have been drawn. The cube skews draws towards the front, so top ranks
/// usually survive while the rest still get a chance.
///
/// # Returns
///
/// The `population / 2` remaining positions, in ascending order.
pub fn select_death_set<R: Rng>(population: usize, rng: &mut R) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..population).collect();
    let deaths = population / 2;
    for _ in 0..population - deaths {
        let u: f64 = rng.random();
        let pick = ((u.powi(3) * pool.len() as f64) as usize).min(pool.len() - 1);
        pool.remove(pick);
    }
    pool
}

/// Positions not in `death_set`, in ascending order.
pub fn survivors(population: usize, death_set: &[usize]) -> Vec<usize> {
    let mut dead = vec![false; population];
    for &slot in death_set {
        if let Some(flag) = dead.get_mut(slot) {
            *flag = true;
        }
    }
    (0..population).filter(|&i| !dead[i]).collect()
}

/// Replaces every runner in `death_set` with a mutated copy of a survivor.
///
/// The `k`-th dead slot, in `death_set` order, receives a child of the `k`-th
/// survivor in positional order. Children are stamped with `birth_generation`
/// and fresh ids from `ids`.
pub fn replace_dead<R: Rng>(
    runners: &mut [Runner],
    death_set: &[usize],
    birth_generation: u32,
    ids: &mut RunnerIds,
    params: &Params,
    rng: &mut R,
) {
    let parents = survivors(runners.len(), death_set);
    for (&slot, &parent) in death_set.iter().zip(&parents) {
        let child = runners[parent].offspring(ids.next_id(), birth_generation, params, rng);
        runners[slot] = child;
    }
}
