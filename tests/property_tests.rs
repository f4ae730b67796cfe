#![allow(missing_docs)]

use std::collections::HashSet;

use evo_track::simulation::brain::Brain;
use evo_track::simulation::evolution::select_death_set;
use evo_track::simulation::geometric_utils::normalize_degrees;
use evo_track::simulation::params::Params;
use evo_track::simulation::runner::{Perception, Runner, heading_signal};
use evo_track::simulation::track::Track;
use ndarray::Array1;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mutation_keeps_brains_in_bounds(seed in any::<u64>(), rounds in 1usize..40) {
        let params = Params::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut brain = Brain::new_random(&params.layer_sizes(), &params, &mut rng).unwrap();
        for _ in 0..rounds {
            brain.mutate(&params, &mut rng);
        }
        prop_assert!(brain.mutability() >= params.min_mutability);
        prop_assert!(brain.mutability() <= params.max_mutability);
        for layer in brain.layers() {
            prop_assert!(layer.weights.iter().all(|w| (-1.0..=1.0).contains(w)));
        }
    }

    #[test]
    fn outputs_stay_inside_unit_interval(
        seed in any::<u64>(),
        inputs in proptest::collection::vec(-1.0f64..=1.0, 10),
    ) {
        let params = Params::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut brain = Brain::new_random(&params.layer_sizes(), &params, &mut rng).unwrap();
        let outputs = brain.infer(&Array1::from(inputs)).unwrap();
        prop_assert_eq!(outputs.len(), 2);
        prop_assert!(outputs.iter().all(|o| *o > -1.0 && *o < 1.0));
    }

    #[test]
    fn runner_state_stays_in_range(seed in any::<u64>(), ticks in 1usize..150, kill in any::<bool>()) {
        let params = Params { kill_on_collision: kill, ..Params::default() };
        let track = Track::default_track();
        let perception = Perception::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut runner = Runner::new_founder(0, &params, &mut rng).unwrap();
        track.enter(&mut runner);
        for _ in 0..ticks {
            runner.tick(&track, &params, &perception).unwrap();
            prop_assert!(runner.angle >= 0.0 && runner.angle < 360.0);
            prop_assert!(runner.speed >= params.min_speed && runner.speed <= params.max_speed);
        }
    }

    #[test]
    fn death_sets_are_distinct_halves(seed in any::<u64>(), n in 2usize..300) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let death_set = select_death_set(n, &mut rng);
        let distinct: HashSet<usize> = death_set.iter().copied().collect();
        prop_assert_eq!(death_set.len(), n / 2);
        prop_assert_eq!(distinct.len(), n / 2);
        prop_assert!(death_set.iter().all(|&i| i < n));
    }

    #[test]
    fn normalized_angles_wrap_into_range(angle in -1.0e6f64..1.0e6) {
        let wrapped = normalize_degrees(angle);
        prop_assert!((0.0..360.0).contains(&wrapped));
    }

    #[test]
    fn heading_signal_is_bounded(angle in 0.0f64..360.0) {
        let signal = heading_signal(angle);
        prop_assert!((-1.0..=1.0).contains(&signal));
    }
}
