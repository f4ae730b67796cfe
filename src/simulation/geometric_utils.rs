//! Geometric utility functions for distance calculations and line intersections.
//!
//! Positions use screen coordinates: `x` grows to the right, `y` grows
//! downwards, and a heading of `a` degrees points along `(cos a, sin a)`.

use geo::algorithm::Distance;
use geo::{Coord, Euclidean, Line, Point};

/// Direction vectors with an `x` component below this are treated as vertical.
pub const VERTICAL_EPSILON: f64 = 1e-12;

/// Slack allowed when testing whether a point lies within a segment.
const SEGMENT_TOLERANCE: f64 = 1e-9;

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector for a heading in degrees.
pub fn heading_vector(angle: f64) -> Coord<f64> {
    let radians = angle.to_radians();
    Coord {
        x: radians.cos(),
        y: radians.sin(),
    }
}

/// Heading in degrees, in `[0, 360)`, of the direction from `from` to `to`.
pub fn bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    normalize_degrees((to.y - from.y).atan2(to.x - from.x).to_degrees())
}

/// Euclidean distance between two points.
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Calculates the minimum distance between a point and a line segment.
///
/// # Arguments
///
/// * `point` - Query point
/// * `segment` - Line segment, possibly of zero length
///
/// # Returns
///
/// The minimum Euclidean distance from the point to any point on the segment.
pub fn point_segment_distance(point: Coord<f64>, segment: &Line<f64>) -> f64 {
    Euclidean.distance(&Point::from(point), segment)
}

/// An infinite line, kept in a form that represents vertical lines exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineForm {
    /// `x = const`.
    Vertical {
        /// The constant `x`.
        x: f64,
    },
    /// `y = slope * x + intercept`.
    Sloped {
        /// Rise over run.
        slope: f64,
        /// Value of `y` at `x = 0`.
        intercept: f64,
    },
}

impl LineForm {
    /// The line through two points. Coincident points yield a vertical line.
    pub fn through(a: Coord<f64>, b: Coord<f64>) -> Self {
        if a.x == b.x {
            return Self::Vertical { x: a.x };
        }
        let slope = (b.y - a.y) / (b.x - a.x);
        Self::Sloped {
            slope,
            intercept: a.y - slope * a.x,
        }
    }

    /// The line through `origin` along a heading in degrees.
    pub fn from_heading(origin: Coord<f64>, angle: f64) -> Self {
        let direction = heading_vector(angle);
        if direction.x.abs() < VERTICAL_EPSILON {
            return Self::Vertical { x: origin.x };
        }
        let slope = direction.y / direction.x;
        Self::Sloped {
            slope,
            intercept: origin.y - slope * origin.x,
        }
    }

    /// The line through `point` perpendicular to this one.
    pub fn perpendicular_through(&self, point: Coord<f64>) -> Self {
        match *self {
            Self::Vertical { .. } => Self::Sloped {
                slope: 0.0,
                intercept: point.y,
            },
            Self::Sloped { slope, .. } if slope == 0.0 => Self::Vertical { x: point.x },
            Self::Sloped { slope, .. } => {
                let perpendicular = -1.0 / slope;
                Self::Sloped {
                    slope: perpendicular,
                    intercept: point.y - perpendicular * point.x,
                }
            }
        }
    }

    /// Intersection point of two lines, `None` when they are parallel.
    pub fn intersection(&self, other: &Self) -> Option<Coord<f64>> {
        match (*self, *other) {
            (Self::Vertical { .. }, Self::Vertical { .. }) => None,
            (Self::Vertical { x }, Self::Sloped { slope, intercept })
            | (Self::Sloped { slope, intercept }, Self::Vertical { x }) => Some(Coord {
                x,
                y: slope * x + intercept,
            }),
            (
                Self::Sloped {
                    slope: m1,
                    intercept: b1,
                },
                Self::Sloped {
                    slope: m2,
                    intercept: b2,
                },
            ) => {
                if m1 == m2 {
                    return None;
                }
                let x = (b2 - b1) / (m1 - m2);
                Some(Coord { x, y: m1 * x + b1 })
            }
        }
    }

    /// The two points where this line meets a circle, `None` if it misses.
    ///
    /// A tangent line returns the touching point twice.
    pub fn circle_intersections(
        &self,
        center: Coord<f64>,
        radius: f64,
    ) -> Option<(Coord<f64>, Coord<f64>)> {
        match *self {
            Self::Vertical { x } => {
                let dx = x - center.x;
                let discriminant = radius * radius - dx * dx;
                if discriminant < 0.0 {
                    return None;
                }
                let half = discriminant.sqrt();
                Some((
                    Coord {
                        x,
                        y: center.y - half,
                    },
                    Coord {
                        x,
                        y: center.y + half,
                    },
                ))
            }
            Self::Sloped { slope, intercept } => {
                let offset = intercept - center.y;
                let a = 1.0 + slope * slope;
                let b = 2.0 * (slope * offset - center.x);
                let c = center.x * center.x + offset * offset - radius * radius;
                let discriminant = b * b - 4.0 * a * c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                let x1 = (-b - root) / (2.0 * a);
                let x2 = (-b + root) / (2.0 * a);
                Some((
                    Coord {
                        x: x1,
                        y: slope * x1 + intercept,
                    },
                    Coord {
                        x: x2,
                        y: slope * x2 + intercept,
                    },
                ))
            }
        }
    }
}

/// Whether `point`, assumed to lie on the segment's line, falls between its endpoints.
pub fn within_segment(point: Coord<f64>, segment: &Line<f64>) -> bool {
    let length = distance(segment.start, segment.end) + SEGMENT_TOLERANCE;
    distance(point, segment.start) <= length && distance(point, segment.end) <= length
}

/// Casts a ray from `origin` along `angle` degrees against one segment.
///
/// # Returns
///
/// Distance from `origin` to the hit point, or `None` if the ray's line is
/// parallel to the segment, meets it outside its endpoints, or meets it
/// behind the origin.
pub fn ray_segment_distance(origin: Coord<f64>, angle: f64, segment: &Line<f64>) -> Option<f64> {
    let ray = LineForm::from_heading(origin, angle);
    let hit = ray.intersection(&LineForm::through(segment.start, segment.end))?;
    if !within_segment(hit, segment) {
        return None;
    }

    let dist = distance(origin, hit);
    if dist > 0.0 {
        let offset = normalize_degrees(bearing(origin, hit) - angle);
        if (90.0..=270.0).contains(&offset) {
            return None;
        }
    }
    Some(dist)
}
