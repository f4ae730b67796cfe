//! Directional scoring lines.
//!
//! A scoring line rewards runners that cross it in its "correct" direction and
//! penalizes crossings the other way. The correct side is defined by the
//! line's orientation (start to end) and its polarity.

use geo::{Coord, Line};
use serde::{Deserialize, Serialize};

use super::geometric_utils::{LineForm, distance, normalize_degrees, within_segment};

/// Result of checking one movement against a scoring line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// No crossing, or a crossing that earns nothing.
    Neutral,
    /// Entered the line from the correct side.
    Rewarded,
    /// Left the line on the wrong side.
    Penalized,
}

impl Crossing {
    /// Multiplier applied to the line gain.
    pub fn factor(self) -> f64 {
        match self {
            Self::Neutral => 0.0,
            Self::Rewarded => 1.0,
            Self::Penalized => -1.0,
        }
    }
}

/// A directional line segment on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScoringLineRecord", into = "ScoringLineRecord")]
pub struct ScoringLine {
    line: Line<f64>,
    positive: bool,
    angle: f64,
    center: Coord<f64>,
}

#[derive(Serialize, Deserialize)]
struct ScoringLineRecord {
    line: Line<f64>,
    positive: bool,
}

impl From<ScoringLineRecord> for ScoringLine {
    fn from(record: ScoringLineRecord) -> Self {
        Self::new(record.line, record.positive)
    }
}

impl From<ScoringLine> for ScoringLineRecord {
    fn from(scoring: ScoringLine) -> Self {
        Self {
            line: scoring.line,
            positive: scoring.positive,
        }
    }
}

impl ScoringLine {
    /// Creates a scoring line and caches its orientation and midpoint.
    pub fn new(line: Line<f64>, positive: bool) -> Self {
        let mut scoring = Self {
            line,
            positive,
            angle: 0.0,
            center: line.start,
        };
        scoring.recompute();
        scoring
    }

    fn recompute(&mut self) {
        let Line { start, end } = self.line;
        self.angle = normalize_degrees((start.y - end.y).atan2(start.x - end.x).to_degrees());
        self.center = Coord {
            x: (start.x + end.x) / 2.0,
            y: (start.y + end.y) / 2.0,
        };
    }

    /// The underlying segment.
    pub fn line(&self) -> Line<f64> {
        self.line
    }

    /// Polarity: which side counts as the correct approach.
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Orientation in degrees, `[0, 360)`.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Midpoint of the segment.
    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    /// Replaces the segment and refreshes cached geometry.
    pub fn set_line(&mut self, line: Line<f64>) {
        self.line = line;
        self.recompute();
    }

    /// Flips the correct crossing direction.
    pub fn swap_polarity(&mut self) {
        self.positive = !self.positive;
    }

    /// Whether a circle of `radius` at `center` touches the segment.
    pub fn intersects_circle(&self, center: Coord<f64>, radius: f64) -> bool {
        let Line { start, end } = self.line;
        if distance(center, start) <= radius || distance(center, end) <= radius {
            return true;
        }

        if start.y == end.y {
            let (min_x, max_x) = (start.x.min(end.x), start.x.max(end.x));
            return min_x < center.x && center.x < max_x && (center.y - start.y).abs() < radius;
        }
        if start.x == end.x {
            let (min_y, max_y) = (start.y.min(end.y), start.y.max(end.y));
            return min_y < center.y && center.y < max_y && (center.x - start.x).abs() < radius;
        }

        let form = LineForm::through(start, end);
        form.intersection(&form.perpendicular_through(center))
            .is_some_and(|foot| distance(center, foot) <= radius && within_segment(foot, &self.line))
    }

    /// Whether `point` lies on the positive side of the line's orientation.
    fn on_positive_side(&self, point: Coord<f64>) -> bool {
        let to_start = (self.line.start.y - point.y)
            .atan2(self.line.start.x - point.x)
            .to_degrees();
        normalize_degrees(90.0 + to_start - self.angle) < 90.0
    }

    /// Classifies the move from `old` to `new` of a circle of `radius`.
    ///
    /// Entering the line from the correct side is rewarded only when
    /// `allow_reward` is set. Leaving it on the wrong side is always penalized.
    pub fn crossed(
        &self,
        old: Coord<f64>,
        new: Coord<f64>,
        radius: f64,
        allow_reward: bool,
    ) -> Crossing {
        let was_on = self.intersects_circle(old, radius);
        let is_on = self.intersects_circle(new, radius);

        match (was_on, is_on) {
            (true, false) => {
                if self.on_positive_side(new) == self.positive {
                    Crossing::Penalized
                } else {
                    Crossing::Neutral
                }
            }
            (false, true) if allow_reward => {
                if self.on_positive_side(old) == self.positive {
                    Crossing::Rewarded
                } else {
                    Crossing::Neutral
                }
            }
            _ => Crossing::Neutral,
        }
    }
}
