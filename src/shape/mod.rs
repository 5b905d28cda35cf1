//! Geometric primitives that make up a drawable path.

/*
Shapes
======

Everything the engine draws is built from a handful of primitive segments.
Each one answers two questions:

  length          How far the beam travels along this segment. Used to
                  spend time on each segment in proportion to its size, so
                  the beam moves at a constant speed across the whole path.

  position_at(t)  Where the beam is after travelling fraction `t` (0.0 to
                  1.0) of the segment.

Primitives
----------

  Line            Straight segment from `start` to `end`.

  CircleArc       Elliptical arc around `center` with radii (rx, ry),
                  starting at `start_angle` and sweeping `sweep` radians.
                  Radii may be negative, which mirrors the arc; that keeps
                  scaling by a negative factor exact.

  QuadraticBezier Curve with one control point.
  CubicBezier     Curve with two control points.

  Point           A single dot. Zero length: the beam jumps to it and
                  spends no time there, so it only becomes visible when
                  effects or neighbouring zero-length shapes linger.

Curved lengths use a piecewise-linear approximation with LENGTH_SEGMENTS
chords. The error is well below a pixel for scope-sized paths and the cost
is paid once per frame, never per sample.

Transforms
----------

translate/scale/rotate mutate the shape in place. Lengths are not stored on
the shape itself: a `Frame` computes and caches them when it is built, and a
frame's shapes are never mutated afterwards. Rotating an ellipse (rx != ry)
rotates its centre and start angle only, which is exact for circles and an
approximation for ellipses.
*/

mod frame;
mod point;

pub use frame::Frame;
pub use point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chords used to approximate the length of curved shapes.
const LENGTH_SEGMENTS: usize = 64;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Line {
        start: Point,
        end: Point,
    },
    CircleArc {
        center: Point,
        radius_x: f32,
        radius_y: f32,
        start_angle: f32,
        sweep: f32,
    },
    QuadraticBezier {
        p0: Point,
        p1: Point,
        p2: Point,
    },
    CubicBezier {
        p0: Point,
        p1: Point,
        p2: Point,
        p3: Point,
    },
    Point(Point),
}

impl Shape {
    pub fn line(start: Point, end: Point) -> Self {
        Shape::Line { start, end }
    }

    /// Full circle starting at angle 0.
    pub fn circle(center: Point, radius: f32) -> Self {
        Shape::CircleArc {
            center,
            radius_x: radius,
            radius_y: radius,
            start_angle: 0.0,
            sweep: std::f32::consts::TAU,
        }
    }

    pub fn arc(center: Point, radius_x: f32, radius_y: f32, start_angle: f32, sweep: f32) -> Self {
        Shape::CircleArc {
            center,
            radius_x,
            radius_y,
            start_angle,
            sweep,
        }
    }

    pub fn quadratic(p0: Point, p1: Point, p2: Point) -> Self {
        Shape::QuadraticBezier { p0, p1, p2 }
    }

    pub fn cubic(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Shape::CubicBezier { p0, p1, p2, p3 }
    }

    pub fn point(p: Point) -> Self {
        Shape::Point(p)
    }

    /// Position after travelling `progress` (0.0 to 1.0) of the shape.
    ///
    /// Values outside the unit range are clamped.
    pub fn position_at(&self, progress: f32) -> Point {
        let t = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };

        match *self {
            Shape::Line { start, end } => start.lerp(end, t),
            Shape::CircleArc {
                center,
                radius_x,
                radius_y,
                start_angle,
                sweep,
            } => {
                let angle = start_angle + sweep * t;
                Point {
                    x: center.x + radius_x * angle.cos(),
                    y: center.y + radius_y * angle.sin(),
                    z: center.z,
                }
            }
            Shape::QuadraticBezier { p0, p1, p2 } => {
                let u = 1.0 - t;
                p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
            }
            Shape::CubicBezier { p0, p1, p2, p3 } => {
                let u = 1.0 - t;
                p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
            }
            Shape::Point(p) => p,
        }
    }

    /// Arc length of the shape in the XY plane.
    ///
    /// Computed on every call; `Frame` caches the result.
    pub fn length(&self) -> f32 {
        let length = match *self {
            Shape::Line { start, end } => start.distance(end),
            Shape::Point(_) => 0.0,
            Shape::CircleArc { .. } | Shape::QuadraticBezier { .. } | Shape::CubicBezier { .. } => {
                self.chord_length()
            }
        };

        if length.is_finite() {
            length
        } else {
            0.0
        }
    }

    fn chord_length(&self) -> f32 {
        let mut total = 0.0;
        let mut previous = self.position_at(0.0);
        for i in 1..=LENGTH_SEGMENTS {
            let next = self.position_at(i as f32 / LENGTH_SEGMENTS as f32);
            total += previous.distance(next);
            previous = next;
        }
        total
    }

    /// First point the beam visits on this shape.
    pub fn start(&self) -> Point {
        self.position_at(0.0)
    }

    /// Last point the beam visits on this shape.
    pub fn end(&self) -> Point {
        self.position_at(1.0)
    }

    pub fn translate(&mut self, offset: Point) {
        self.map_points(|p| p + offset);
    }

    pub fn scale(&mut self, factor: Point) {
        if let Shape::CircleArc {
            radius_x, radius_y, ..
        } = self
        {
            *radius_x *= factor.x;
            *radius_y *= factor.y;
        }
        self.map_points(|p| p.scale(factor));
    }

    pub fn rotate(&mut self, radians: f32) {
        if let Shape::CircleArc {
            radius_x,
            radius_y,
            start_angle,
            ..
        } = self
        {
            // A mirrored arc runs the other way round.
            if (*radius_x < 0.0) != (*radius_y < 0.0) {
                *start_angle -= radians;
            } else {
                *start_angle += radians;
            }
        }
        self.map_points(|p| p.rotate(radians));
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        match self {
            Shape::Line { start, end } => {
                *start = f(*start);
                *end = f(*end);
            }
            Shape::CircleArc { center, .. } => *center = f(*center),
            Shape::QuadraticBezier { p0, p1, p2 } => {
                *p0 = f(*p0);
                *p1 = f(*p1);
                *p2 = f(*p2);
            }
            Shape::CubicBezier { p0, p1, p2, p3 } => {
                *p0 = f(*p0);
                *p1 = f(*p1);
                *p2 = f(*p2);
                *p3 = f(*p3);
            }
            Shape::Point(p) => *p = f(*p),
        }
    }

    /// Axis-aligned bounds of the shape, sampled at the same resolution used
    /// for lengths.
    pub(crate) fn bounds(&self) -> (Point, Point) {
        let mut min = self.position_at(0.0);
        let mut max = min;
        let steps = match self {
            Shape::Line { .. } => 1,
            Shape::Point(_) => 0,
            _ => LENGTH_SEGMENTS,
        };
        for i in 1..=steps {
            let p = self.position_at(i as f32 / steps as f32);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }
}
