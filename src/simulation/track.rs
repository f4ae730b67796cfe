//! Race tracks: walls, scoring lines and a start pose.
//!
//! Tracks answer the three queries runners need every tick (wall raycasts,
//! wall collisions and scoring-line crossings) and offer the editing
//! operations used to build new circuits.

use std::path::Path;

use geo::{Coord, Line};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::PersistenceError;
use super::geometric_utils::{
    LineForm, distance, heading_vector, point_segment_distance, ray_segment_distance,
};
use super::params::Params;
use super::runner::Runner;
use super::scoring_line::ScoringLine;

/// Identifies one segment of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentRef {
    /// Index into [`Track::walls`].
    Wall(usize),
    /// Index into [`Track::scoring_lines`].
    Scoring(usize),
}

/// One end of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `line.start`.
    Start,
    /// `line.end`.
    End,
}

/// Identifies one endpoint of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointRef {
    /// Segment owning the endpoint.
    pub segment: SegmentRef,
    /// Which end.
    pub endpoint: Endpoint,
}

/// A resolved wall contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Index of the wall that was hit.
    pub wall: usize,
    /// Point on the runner's circle used to measure penetration.
    pub tangent: Coord<f64>,
    /// Distance from the tangent point back to the wall along the heading.
    pub push_distance: f64,
}

/// A closed circuit of walls with directional scoring lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    walls: Vec<Line<f64>>,
    scoring_lines: Vec<ScoringLine>,
    start: Coord<f64>,
    start_angle: f64,
    #[serde(default)]
    revision: u64,
}

/// Returns the two tangent points of a circle overlapping `wall`, if it does.
fn wall_contact(wall: &Line<f64>, center: Coord<f64>, radius: f64) -> Option<(Coord<f64>, Coord<f64>)> {
    let Line { start, end } = *wall;
    if start.x == end.x {
        let (min_y, max_y) = (start.y.min(end.y), start.y.max(end.y));
        let touching = (min_y..=max_y).contains(&center.y) && (center.x - start.x).abs() < radius;
        return touching.then(|| {
            (
                Coord { x: center.x - radius, y: center.y },
                Coord { x: center.x + radius, y: center.y },
            )
        });
    }
    if start.y == end.y {
        let (min_x, max_x) = (start.x.min(end.x), start.x.max(end.x));
        let touching = (min_x..=max_x).contains(&center.x) && (center.y - start.y).abs() < radius;
        return touching.then(|| {
            (
                Coord { x: center.x, y: center.y - radius },
                Coord { x: center.x, y: center.y + radius },
            )
        });
    }

    let form = LineForm::through(start, end);
    let normal = form.perpendicular_through(center);
    let foot = form.intersection(&normal)?;
    let length = distance(start, end);
    if distance(foot, start) < length && distance(foot, end) < length && distance(center, foot) < radius {
        normal.circle_intersections(center, radius)
    } else {
        None
    }
}

/// Distance travelled from `tangent` along `angle` until the wall's line is met.
fn push_distance(tangent: Coord<f64>, wall: &Line<f64>, angle: f64) -> f64 {
    LineForm::from_heading(tangent, angle)
        .intersection(&LineForm::through(wall.start, wall.end))
        .map_or(0.0, |hit| distance(tangent, hit))
}

impl Track {
    /// Creates an empty track with the given start pose.
    pub fn new(start: Coord<f64>, start_angle: f64) -> Self {
        Self {
            walls: Vec::new(),
            scoring_lines: Vec::new(),
            start,
            start_angle,
            revision: 0,
        }
    }

    /// The built-in square circuit.
    ///
    /// Runners start at `(100, 0)` facing `0°` inside a corridor between an
    /// outer square `(-100, -100)..(2100, 2100)` and an inner square
    /// `(300, 300)..(1700, 1700)`, lapping clockwise on screen through twelve
    /// positive scoring lines.
    pub fn default_track() -> Self {
        let mut track = Self::new(Coord { x: 100.0, y: 0.0 }, 0.0);
        for square in [(-100.0, 2100.0), (300.0, 1700.0)] {
            let (lo, hi) = square;
            let corners = [(lo, lo), (hi, lo), (hi, hi), (lo, hi)];
            for i in 0..corners.len() {
                let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
                track.walls.push(Line::new(Coord { x: a.0, y: a.1 }, Coord { x: b.0, y: b.1 }));
            }
        }

        let lines = [
            (400.0, 300.0, 400.0, -100.0),
            (1000.0, 300.0, 1000.0, -100.0),
            (1600.0, 300.0, 1600.0, -100.0),
            (1700.0, 400.0, 2100.0, 400.0),
            (1700.0, 1000.0, 2100.0, 1000.0),
            (1700.0, 1600.0, 2100.0, 1600.0),
            (400.0, 1700.0, 400.0, 2100.0),
            (1000.0, 1700.0, 1000.0, 2100.0),
            (1600.0, 1700.0, 1600.0, 2100.0),
            (300.0, 400.0, -100.0, 400.0),
            (300.0, 1000.0, -100.0, 1000.0),
            (300.0, 1600.0, -100.0, 1600.0),
        ];
        track.scoring_lines = lines
            .iter()
            .map(|&(x1, y1, x2, y2)| {
                ScoringLine::new(Line::new(Coord { x: x1, y: y1 }, Coord { x: x2, y: y2 }), true)
            })
            .collect();
        track
    }

    /// Wall segments.
    pub fn walls(&self) -> &[Line<f64>] {
        &self.walls
    }

    /// Scoring lines.
    pub fn scoring_lines(&self) -> &[ScoringLine] {
        &self.scoring_lines
    }

    /// Start position of every test run.
    pub fn start(&self) -> Coord<f64> {
        self.start
    }

    /// Start heading in degrees.
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Counter bumped on every edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Resets a runner onto the start pose for a new test run.
    pub fn enter(&self, runner: &mut Runner) {
        runner.place(self.start, self.start_angle);
    }

    /// Distance from `origin` to the nearest wall along `angle` degrees.
    ///
    /// Hits farther than `max_distance` are ignored.
    pub fn ray_distance(&self, origin: Coord<f64>, angle: f64, max_distance: f64) -> Option<f64> {
        self.walls
            .iter()
            .filter_map(|wall| ray_segment_distance(origin, angle, wall))
            .filter(|&dist| dist <= max_distance)
            .min_by(f64::total_cmp)
    }

    /// Resolves the first wall the runner overlaps.
    ///
    /// On contact the runner is either killed or pushed back along its
    /// heading (opposite to its velocity) and has its speed halved if it was
    /// moving faster than a tenth of the maximum speed.
    ///
    /// # Returns
    ///
    /// The contact that was resolved, or `None` if the runner touches no wall
    /// or is already dead.
    pub fn collide(&self, runner: &mut Runner, params: &Params) -> Option<Collision> {
        if !runner.alive {
            return None;
        }
        let radius = params.runner_radius;
        let (wall, (first, second)) = self
            .walls
            .iter()
            .enumerate()
            .find_map(|(i, w)| wall_contact(w, runner.pos, radius).map(|points| (i, points)))?;

        let direction = heading_vector(runner.angle);
        let projected = runner.pos + direction * runner.speed;
        let tangent = if distance(projected, first) < distance(projected, second) {
            first
        } else {
            second
        };
        let push = push_distance(tangent, &self.walls[wall], runner.angle);

        if params.kill_on_collision {
            runner.kill();
        } else {
            let mut step = push.min(params.max_speed);
            if runner.speed > 0.0 {
                step = -step;
            }
            runner.pos = runner.pos + direction * step;
            if runner.speed.abs() > (params.max_speed * 0.1).abs() {
                runner.set_speed(runner.speed * 0.5, params);
            }
        }

        Some(Collision {
            wall,
            tangent,
            push_distance: push,
        })
    }

    /// Applies every scoring line to the runner's last move.
    ///
    /// # Returns
    ///
    /// The fitness change, already added to the runner.
    pub fn score_lines(&self, runner: &mut Runner, params: &Params) -> f64 {
        let delta: f64 = self
            .scoring_lines
            .iter()
            .map(|line| {
                line.crossed(
                    runner.last_pos,
                    runner.pos,
                    params.runner_radius,
                    params.fitness_lines_give,
                )
                .factor()
                    * params.fitness_gain
            })
            .sum();
        runner.current_fitness += delta;
        delta
    }

    /// The segment behind a reference.
    pub fn segment(&self, segment: SegmentRef) -> Option<Line<f64>> {
        match segment {
            SegmentRef::Wall(i) => self.walls.get(i).copied(),
            SegmentRef::Scoring(i) => self.scoring_lines.get(i).map(ScoringLine::line),
        }
    }

    fn segments(&self) -> impl Iterator<Item = (SegmentRef, Line<f64>)> + '_ {
        let walls = self
            .walls
            .iter()
            .enumerate()
            .map(|(i, line)| (SegmentRef::Wall(i), *line));
        let scoring = self
            .scoring_lines
            .iter()
            .enumerate()
            .map(|(i, line)| (SegmentRef::Scoring(i), line.line()));
        walls.chain(scoring)
    }

    fn replace_segment(&mut self, segment: SegmentRef, line: Line<f64>) -> bool {
        let replaced = match segment {
            SegmentRef::Wall(i) => self.walls.get_mut(i).map(|wall| *wall = line).is_some(),
            SegmentRef::Scoring(i) => self
                .scoring_lines
                .get_mut(i)
                .map(|scoring| scoring.set_line(line))
                .is_some(),
        };
        if replaced {
            self.touch();
        }
        replaced
    }

    /// Appends a wall and returns its index.
    pub fn add_wall(&mut self, line: Line<f64>) -> usize {
        self.walls.push(line);
        self.touch();
        debug!(revision = self.revision, "wall added");
        self.walls.len() - 1
    }

    /// Appends a scoring line and returns its index.
    pub fn add_scoring_line(&mut self, line: Line<f64>, positive: bool) -> usize {
        self.scoring_lines.push(ScoringLine::new(line, positive));
        self.touch();
        debug!(revision = self.revision, positive, "scoring line added");
        self.scoring_lines.len() - 1
    }

    /// Removes a segment. Later indices of the same kind shift down by one.
    pub fn remove(&mut self, segment: SegmentRef) -> bool {
        let removed = match segment {
            SegmentRef::Wall(i) if i < self.walls.len() => {
                self.walls.remove(i);
                true
            }
            SegmentRef::Scoring(i) if i < self.scoring_lines.len() => {
                self.scoring_lines.remove(i);
                true
            }
            _ => false,
        };
        if removed {
            self.touch();
            debug!(revision = self.revision, ?segment, "segment removed");
        }
        removed
    }

    /// The segment closest to `point`, if one lies within `range`.
    ///
    /// Walls win ties against scoring lines.
    pub fn nearest_segment(&self, point: Coord<f64>, range: f64) -> Option<SegmentRef> {
        self.segments()
            .map(|(segment, line)| (segment, point_segment_distance(point, &line)))
            .filter(|&(_, dist)| dist < range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(segment, _)| segment)
    }

    /// Removes the segment closest to `point` within `range`.
    pub fn remove_nearest(&mut self, point: Coord<f64>, range: f64) -> Option<SegmentRef> {
        let segment = self.nearest_segment(point, range)?;
        self.remove(segment);
        Some(segment)
    }

    /// The endpoint closest to `point`, if one lies within `range`.
    pub fn nearest_endpoint(&self, point: Coord<f64>, range: f64) -> Option<EndpointRef> {
        self.segments()
            .flat_map(|(segment, line)| {
                [
                    (EndpointRef { segment, endpoint: Endpoint::Start }, line.start),
                    (EndpointRef { segment, endpoint: Endpoint::End }, line.end),
                ]
            })
            .map(|(reference, at)| (reference, distance(point, at)))
            .filter(|&(_, dist)| dist < range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(reference, _)| reference)
    }

    /// Position of an endpoint.
    pub fn endpoint(&self, reference: EndpointRef) -> Option<Coord<f64>> {
        let line = self.segment(reference.segment)?;
        Some(match reference.endpoint {
            Endpoint::Start => line.start,
            Endpoint::End => line.end,
        })
    }

    /// Moves one endpoint to `to`.
    pub fn move_endpoint(&mut self, reference: EndpointRef, to: Coord<f64>) -> bool {
        let Some(mut line) = self.segment(reference.segment) else {
            return false;
        };
        match reference.endpoint {
            Endpoint::Start => line.start = to,
            Endpoint::End => line.end = to,
        }
        self.replace_segment(reference.segment, line)
    }

    /// Moves the endpoint closest to `point` within `range` to `to`.
    pub fn move_nearest_endpoint(
        &mut self,
        point: Coord<f64>,
        to: Coord<f64>,
        range: f64,
    ) -> Option<EndpointRef> {
        let reference = self.nearest_endpoint(point, range)?;
        self.move_endpoint(reference, to);
        debug!(revision = self.revision, ?reference, "endpoint moved");
        Some(reference)
    }

    /// Translates a whole segment by `offset`.
    pub fn translate_segment(&mut self, segment: SegmentRef, offset: Coord<f64>) -> bool {
        let Some(line) = self.segment(segment) else {
            return false;
        };
        self.replace_segment(segment, Line::new(line.start + offset, line.end + offset))
    }

    /// Flips the polarity of the scoring line closest to `point` within `range`.
    pub fn swap_nearest_polarity(&mut self, point: Coord<f64>, range: f64) -> Option<usize> {
        let index = self
            .scoring_lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i, point_segment_distance(point, &line.line())))
            .filter(|&(_, dist)| dist < range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)?;
        self.scoring_lines[index].swap_polarity();
        self.touch();
        Some(index)
    }

    /// Sets where and facing which way runners start.
    pub fn set_start(&mut self, start: Coord<f64>, angle: f64) {
        self.start = start;
        self.start_angle = angle;
        self.touch();
    }

    /// Saves the track to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a track from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path)?;
        let track = serde_json::from_str(&json)?;
        Ok(track)
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::default_track()
    }
}
