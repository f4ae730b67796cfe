#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use evo_track::simulation::brain::Brain;
use evo_track::simulation::params::Params;
use evo_track::simulation::runner::{Perception, Runner, Sense, Vision};
use evo_track::simulation::scoring_line::{Crossing, ScoringLine};
use evo_track::simulation::track::{Endpoint, EndpointRef, SegmentRef, Track};
use geo::{Coord, Line};

fn coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line<f64> {
    Line::new(coord(x1, y1), coord(x2, y2))
}

fn create_test_params() -> Params {
    Params {
        fitness_base_gain: 0.0,
        ..Params::default()
    }
}

/// A runner whose brain always outputs zero, so it keeps its speed and heading.
fn coasting_runner(params: &Params, pos: Coord<f64>, angle: f64, speed: f64) -> Runner {
    let brain = Brain::new_zeroed(&params.layer_sizes(), 0.0).unwrap();
    let mut runner = Runner::with_brain(0, brain);
    runner.place(pos, angle);
    runner.speed = speed;
    runner
}

fn run_ticks(runner: &mut Runner, track: &Track, params: &Params, ticks: usize) {
    let perception = Perception::default();
    for _ in 0..ticks {
        runner.tick(track, params, &perception).unwrap();
    }
}

#[test]
fn test_collision_kills_runner() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 0.0, 100.0, 0.0));

    let mut runner = coasting_runner(&params, coord(50.0, 5.0), 270.0, 10.0);
    run_ticks(&mut runner, &track, &params, 1);

    assert!(!runner.is_alive(), "runner should die on wall contact");
    let pos = runner.pos;
    let fitness = runner.current_fitness;

    run_ticks(&mut runner, &track, &params, 5);
    assert_eq!(runner.pos, pos, "dead runners must not move");
    assert_eq!(runner.current_fitness, fitness, "dead runners must not score");
}

#[test]
fn test_collision_pushes_runner_back() {
    let params = Params {
        kill_on_collision: false,
        ..create_test_params()
    };
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 0.0, 100.0, 0.0));

    let mut runner = coasting_runner(&params, coord(50.0, 5.0), 270.0, 10.0);
    let perception = Perception::default();
    runner.step(&track, &params, &perception).unwrap();
    assert!((runner.pos.y + 5.0).abs() < 1e-9);

    let collision = track.collide(&mut runner, &params).expect("runner overlaps the wall");

    assert_eq!(collision.wall, 0);
    assert!((collision.tangent.y + 25.0).abs() < 1e-9);
    assert!((collision.push_distance - 25.0).abs() < 1e-9);
    assert!(runner.is_alive());
    // Push is capped at max_speed and applied against the velocity
    assert!((runner.pos.y - 15.0).abs() < 1e-9, "pos.y = {}", runner.pos.y);
    assert_eq!(runner.speed, 5.0, "speed should be halved");
}

#[test]
fn test_slow_runner_keeps_speed_after_push() {
    let params = Params {
        kill_on_collision: false,
        ..create_test_params()
    };
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 0.0, 100.0, 0.0));

    let mut runner = coasting_runner(&params, coord(50.0, 10.0), 270.0, 1.0);
    track.collide(&mut runner, &params).expect("runner overlaps the wall");
    assert_eq!(runner.speed, 1.0);
}

#[test]
fn test_collision_with_sloped_wall() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 0.0, 100.0, 100.0));

    let mut near = coasting_runner(&params, coord(60.0, 50.0), 0.0, 0.0);
    assert!(track.collide(&mut near, &params).is_some());
    assert!(!near.is_alive());

    let mut far = coasting_runner(&params, coord(90.0, 10.0), 0.0, 0.0);
    assert!(track.collide(&mut far, &params).is_none());
    assert!(far.is_alive());
}

#[test]
fn test_correct_crossing_rewards_once() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_scoring_line(line(400.0, 300.0, 400.0, -100.0), true);

    let mut runner = coasting_runner(&params, coord(350.0, 0.0), 0.0, 10.0);
    run_ticks(&mut runner, &track, &params, 10);

    assert_eq!(runner.pos, coord(450.0, 0.0));
    assert_eq!(runner.current_fitness, params.fitness_gain);
}

#[test]
fn test_reward_disabled_when_lines_do_not_give() {
    let params = Params {
        fitness_lines_give: false,
        ..create_test_params()
    };
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_scoring_line(line(400.0, 300.0, 400.0, -100.0), true);

    let mut runner = coasting_runner(&params, coord(350.0, 0.0), 0.0, 10.0);
    run_ticks(&mut runner, &track, &params, 10);

    assert_eq!(runner.current_fitness, 0.0);
}

#[test]
fn test_wrong_crossing_penalizes_regardless_of_give_flag() {
    for give in [true, false] {
        let params = Params {
            fitness_lines_give: give,
            ..create_test_params()
        };
        let mut track = Track::new(coord(0.0, 0.0), 0.0);
        track.add_scoring_line(line(400.0, 300.0, 400.0, -100.0), true);

        let mut runner = coasting_runner(&params, coord(450.0, 0.0), 180.0, 10.0);
        run_ticks(&mut runner, &track, &params, 10);

        assert!((runner.pos.x - 350.0).abs() < 1e-9);
        assert_eq!(
            runner.current_fitness, -params.fitness_gain,
            "reverse crossing with give = {give}"
        );
    }
}

#[test]
fn test_negative_line_rewards_opposite_direction() {
    let scoring = ScoringLine::new(line(400.0, 300.0, 400.0, -100.0), false);
    let radius = 20.0;

    assert_eq!(
        scoring.crossed(coord(420.0, 0.0), coord(410.0, 0.0), radius, true),
        Crossing::Rewarded
    );
    assert_eq!(
        scoring.crossed(coord(380.0, 0.0), coord(390.0, 0.0), radius, true),
        Crossing::Neutral
    );
    assert_eq!(
        scoring.crossed(coord(410.0, 0.0), coord(420.0, 0.0), radius, true),
        Crossing::Penalized
    );
}

#[test]
fn test_scoring_line_caches_geometry() {
    let mut scoring = ScoringLine::new(line(0.0, 0.0, 100.0, 0.0), true);
    assert_eq!(scoring.center(), coord(50.0, 0.0));
    assert!((scoring.angle() - 180.0).abs() < 1e-9);

    scoring.set_line(line(0.0, 0.0, 0.0, 100.0));
    assert_eq!(scoring.center(), coord(0.0, 50.0));
    assert!((scoring.angle() - 270.0).abs() < 1e-9);
}

#[test]
fn test_circle_touching_endpoint_intersects() {
    let scoring = ScoringLine::new(line(0.0, 0.0, 100.0, 100.0), true);
    assert!(scoring.intersects_circle(coord(-10.0, 0.0), 20.0));
    assert!(scoring.intersects_circle(coord(50.0, 60.0), 20.0));
    assert!(!scoring.intersects_circle(coord(50.0, 90.0), 20.0));
    assert!(!scoring.intersects_circle(coord(200.0, 200.0), 20.0));
}

#[test]
fn test_vision_reads_vertical_and_horizontal_walls() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 100.0, 100.0, 100.0));
    track.add_wall(line(200.0, 0.0, 200.0, 100.0));

    let runner = coasting_runner(&params, coord(50.0, 50.0), 0.0, 0.0);
    let vision = Vision::new().sense(&runner, &track, &params);

    assert_eq!(vision.len(), 8);
    // Ray 0 looks right at the vertical wall 150 away
    assert!((vision[0] - 130.0 / 600.0).abs() < 1e-12);
    // Ray 2 looks down (+y) at the horizontal wall 50 away
    assert!((vision[2] - 30.0 / 600.0).abs() < 1e-12);
    // Ray 6 looks up into open space
    assert_eq!(vision[6], 1.0);
}

#[test]
fn test_vision_is_capped_and_floored() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(2000.0, -100.0, 2000.0, 100.0));
    track.add_wall(line(-10.0, -100.0, -10.0, 100.0));

    let runner = coasting_runner(&params, coord(0.0, 0.0), 0.0, 0.0);
    let vision = Vision::new().sense(&runner, &track, &params);

    assert_eq!(vision[0], 1.0, "far wall reads as maximum distance");
    assert_eq!(vision[4], 0.0, "wall inside the radius reads as zero");
}

#[test]
fn test_ray_ignores_walls_behind_and_outside_segment() {
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(200.0, 200.0, 200.0, 300.0));
    track.add_wall(line(-200.0, 0.0, -200.0, 100.0));
    track.add_wall(line(0.0, 100.0, 100.0, 100.0));

    // Misses the first wall's extent, the second wall is behind, the third is parallel
    assert_eq!(track.ray_distance(coord(50.0, 50.0), 0.0, 1000.0), None);
    let hit = track
        .ray_distance(coord(50.0, 50.0), 180.0, 1000.0)
        .expect("ray should hit the wall on the left");
    assert!((hit - 250.0).abs() < 1e-9);
    assert_eq!(track.ray_distance(coord(50.0, 50.0), 180.0, 100.0), None);
}

#[test]
fn test_zero_length_wall_does_not_panic() {
    let params = create_test_params();
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(10.0, 10.0, 10.0, 10.0));

    let _ = track.ray_distance(coord(0.0, 10.0), 0.0, 1000.0);
    let mut runner = coasting_runner(&params, coord(0.0, 0.0), 0.0, 5.0);
    run_ticks(&mut runner, &track, &params, 3);
    assert!(runner.angle >= 0.0 && runner.angle < 360.0);
}

#[test]
fn test_default_track_layout() {
    let track = Track::default_track();
    assert_eq!(track.walls().len(), 8);
    assert_eq!(track.scoring_lines().len(), 12);
    assert!(track.scoring_lines().iter().all(ScoringLine::is_positive));
    assert_eq!(track.start(), coord(100.0, 0.0));
    assert_eq!(track.start_angle(), 0.0);

    // Outer wall 100 above the start
    assert_eq!(track.ray_distance(track.start(), 270.0, 1000.0), Some(100.0));
}

#[test]
fn test_default_track_rewards_lap_direction() {
    let params = create_test_params();
    let track = Track::default_track();
    let mut runner = coasting_runner(&params, track.start(), 0.0, 10.0);
    run_ticks(&mut runner, &track, &params, 40);

    assert!(runner.is_alive());
    assert_eq!(runner.current_fitness, params.fitness_gain);
}

#[test]
fn test_edits_bump_revision_and_refresh_geometry() {
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    let wall = track.add_wall(line(0.0, 0.0, 100.0, 0.0));
    let scoring = track.add_scoring_line(line(0.0, 50.0, 100.0, 50.0), true);
    assert_eq!(track.revision(), 2);

    assert!(track.translate_segment(SegmentRef::Scoring(scoring), coord(0.0, 10.0)));
    assert_eq!(track.scoring_lines()[0].center(), coord(50.0, 60.0));

    let moved = track
        .move_nearest_endpoint(coord(98.0, 61.0), coord(100.0, 160.0), 10.0)
        .expect("endpoint within range");
    assert_eq!(
        moved,
        EndpointRef {
            segment: SegmentRef::Scoring(scoring),
            endpoint: Endpoint::End
        }
    );
    assert_eq!(track.scoring_lines()[0].center(), coord(50.0, 110.0));
    assert_eq!(track.revision(), 4);

    assert_eq!(track.segment(SegmentRef::Wall(wall)), Some(line(0.0, 0.0, 100.0, 0.0)));
}

#[test]
fn test_nearest_segment_and_removal() {
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_wall(line(0.0, 0.0, 100.0, 0.0));
    track.add_scoring_line(line(0.0, 30.0, 100.0, 30.0), true);

    assert_eq!(track.nearest_segment(coord(50.0, 25.0), 10.0), Some(SegmentRef::Scoring(0)));
    assert_eq!(track.nearest_segment(coord(50.0, 2.0), 10.0), Some(SegmentRef::Wall(0)));
    assert_eq!(track.nearest_segment(coord(50.0, 15.0), 10.0), None);

    assert_eq!(track.remove_nearest(coord(50.0, 2.0), 10.0), Some(SegmentRef::Wall(0)));
    assert!(track.walls().is_empty());
    assert!(!track.remove(SegmentRef::Wall(0)));
}

#[test]
fn test_swap_polarity() {
    let mut track = Track::new(coord(0.0, 0.0), 0.0);
    track.add_scoring_line(line(0.0, 0.0, 100.0, 0.0), true);

    assert_eq!(track.swap_nearest_polarity(coord(50.0, 5.0), 10.0), Some(0));
    assert!(!track.scoring_lines()[0].is_positive());
    assert_eq!(track.swap_nearest_polarity(coord(50.0, 50.0), 10.0), None);
}

#[test]
fn test_enter_resets_runner() {
    let params = create_test_params();
    let mut track = Track::default_track();
    track.set_start(coord(10.0, 20.0), 450.0);

    let mut runner = coasting_runner(&params, coord(500.0, 500.0), 30.0, 7.0);
    runner.current_fitness = 3.0;
    runner.kill();
    track.enter(&mut runner);

    assert_eq!(runner.pos, coord(10.0, 20.0));
    assert_eq!(runner.angle, 90.0);
    assert_eq!(runner.speed, 0.0);
    assert_eq!(runner.current_fitness, 0.0);
    assert!(runner.is_alive());
}

#[test]
fn test_default_perception_senses_in_order() {
    let params = create_test_params();
    let perception = Perception::default();
    let names: Vec<&str> = perception.senses().iter().map(|s| s.name()).collect();

    assert_eq!(names, vec!["vision", "proprioception"]);
    assert_eq!(perception.total_input_size(&params), params.layer_sizes()[0]);
}
