use crate::shape::{Point, Shape};

/// One complete path, traversed once per audio period.
///
/// Shape lengths are computed once here and never change: a frame is
/// immutable after construction and is shared between voices as
/// `Arc<Frame>`.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    shapes: Vec<Shape>,
    lengths: Vec<f32>,
    total_length: f32,
}

impl Frame {
    pub fn new(shapes: Vec<Shape>) -> Self {
        let lengths: Vec<f32> = shapes.iter().map(Shape::length).collect();
        let total_length = lengths.iter().sum();

        Self {
            shapes,
            lengths,
            total_length,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Square spanning `[-0.5, 0.5]` on both axes.
    ///
    /// Sources hand this out when they fail to produce anything better, so
    /// the pipeline always has something to draw.
    pub fn unit_square() -> Self {
        Self::polyline(
            &[
                Point::new(-0.5, -0.5),
                Point::new(0.5, -0.5),
                Point::new(0.5, 0.5),
                Point::new(-0.5, 0.5),
            ],
            true,
        )
    }

    /// Lines joining consecutive points, optionally closing back to the first.
    pub fn polyline(points: &[Point], closed: bool) -> Self {
        let mut shapes: Vec<Shape> = points
            .windows(2)
            .map(|pair| Shape::line(pair[0], pair[1]))
            .collect();

        if closed && points.len() > 2 {
            shapes.push(Shape::line(points[points.len() - 1], points[0]));
        }

        Self::new(shapes)
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`.
    pub fn polygon(sides: usize, radius: f32, rotation: f32) -> Self {
        let sides = sides.max(3);
        let points: Vec<Point> = (0..sides)
            .map(|i| {
                let angle = rotation + std::f32::consts::TAU * i as f32 / sides as f32;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::polyline(&points, true)
    }

    /// Copy of this frame centred on the origin and scaled to fit `[-1, 1]`,
    /// preserving aspect ratio.
    pub fn normalized(&self) -> Self {
        if self.shapes.is_empty() {
            return Self::empty();
        }

        let (mut min, mut max) = self.shapes[0].bounds();
        for shape in &self.shapes[1..] {
            let (lo, hi) = shape.bounds();
            min.x = min.x.min(lo.x);
            min.y = min.y.min(lo.y);
            max.x = max.x.max(hi.x);
            max.y = max.y.max(hi.y);
        }

        let center = Point::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);
        let extent = (max.x - min.x).max(max.y - min.y);
        let factor = if extent > f32::EPSILON { 2.0 / extent } else { 1.0 };

        let shapes = self
            .shapes
            .iter()
            .map(|shape| {
                let mut shape = *shape;
                shape.translate(Point::new(-center.x, -center.y));
                shape.scale(Point::with_z(factor, factor, 1.0));
                shape
            })
            .collect();

        Self::new(shapes)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Cached length of the shape at `index`, or 0.0 if out of range.
    #[inline]
    pub fn shape_length(&self, index: usize) -> f32 {
        self.lengths.get(index).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// True when there is nothing to traverse: no shapes, or only
    /// zero-length ones.
    pub fn is_degenerate(&self) -> bool {
        !(self.total_length > 0.0) || !self.total_length.is_finite()
    }
}

impl FromIterator<Shape> for Frame {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
