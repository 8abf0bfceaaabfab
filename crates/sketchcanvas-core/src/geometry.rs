//! Point-to-curve generation.
//!
//! Turns the raw points of a stroke into a smoothed curve description. The
//! default [`BezierSmoothing`] emits one cubic Bezier segment per point, with
//! control points derived from the neighbors of each point. Callers can plug
//! in any [`CurveGenerator`], including plain closures.

use kurbo::{BezPath, PathEl, Point, Vec2};
use std::fmt;
use std::sync::Arc;

/// Result of running a curve generator over a list of points.
#[derive(Debug, Clone, PartialEq)]
pub enum PathDescriptor {
    /// Nothing to draw.
    Empty,
    /// A single point, drawn as a circle whose radius the caller picks.
    Marker(Point),
    /// A curve starting with a move-to the first point.
    Curve(BezPath),
}

impl PathDescriptor {
    /// SVG path data for curve descriptors.
    pub fn svg_data(&self) -> Option<String> {
        match self {
            PathDescriptor::Curve(path) => Some(svg_path_data(path)),
            _ => None,
        }
    }
}

/// Strategy turning an ordered list of points into a [`PathDescriptor`].
pub trait CurveGenerator {
    fn generate(&self, points: &[Point]) -> PathDescriptor;
}

impl<F> CurveGenerator for F
where
    F: Fn(&[Point]) -> PathDescriptor,
{
    fn generate(&self, points: &[Point]) -> PathDescriptor {
        self(points)
    }
}

/// Shared handle to a curve generator.
#[derive(Clone)]
pub struct SharedCurveGenerator(Arc<dyn CurveGenerator + Send + Sync>);

impl SharedCurveGenerator {
    pub fn new(generator: impl CurveGenerator + Send + Sync + 'static) -> Self {
        Self(Arc::new(generator))
    }

    pub fn generate(&self, points: &[Point]) -> PathDescriptor {
        self.0.generate(points)
    }
}

impl Default for SharedCurveGenerator {
    fn default() -> Self {
        Self::new(BezierSmoothing::default())
    }
}

impl fmt::Debug for SharedCurveGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedCurveGenerator(..)")
    }
}

/// Catmull-Rom-like cubic Bezier smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSmoothing {
    /// Fraction of the neighbor distance used for control point offsets.
    pub smoothing: f64,
}

impl BezierSmoothing {
    pub const DEFAULT_SMOOTHING: f64 = 0.2;
}

impl Default for BezierSmoothing {
    fn default() -> Self {
        Self {
            smoothing: Self::DEFAULT_SMOOTHING,
        }
    }
}

impl BezierSmoothing {
    /// Control point for `current`, pushed along the line from `previous`
    /// to `next`. Missing neighbors fall back to `current`.
    fn control_point(
        &self,
        current: Point,
        previous: Option<Point>,
        next: Option<Point>,
        reverse: bool,
    ) -> Point {
        let previous = previous.unwrap_or(current);
        let next = next.unwrap_or(current);
        let line = next - previous;
        let angle = line.atan2() + if reverse { std::f64::consts::PI } else { 0.0 };
        let length = line.hypot() * self.smoothing;
        current + Vec2::from_angle(angle) * length
    }
}

impl CurveGenerator for BezierSmoothing {
    fn generate(&self, points: &[Point]) -> PathDescriptor {
        match points {
            [] => PathDescriptor::Empty,
            [only] => PathDescriptor::Marker(*only),
            [first, ..] => {
                let mut path = BezPath::new();
                path.move_to(*first);
                for i in 1..points.len() {
                    let start = self.control_point(
                        points[i - 1],
                        i.checked_sub(2).map(|j| points[j]),
                        Some(points[i]),
                        false,
                    );
                    let end = self.control_point(
                        points[i],
                        Some(points[i - 1]),
                        points.get(i + 1).copied(),
                        true,
                    );
                    path.curve_to(start, end, points[i]);
                }
                PathDescriptor::Curve(path)
            }
        }
    }
}

/// Run the default smoothing over `points`.
pub fn generate_path(points: &[Point]) -> PathDescriptor {
    BezierSmoothing::default().generate(points)
}

/// Format a path as SVG path data (`M x,y C x1,y1 x2,y2 x,y ...`).
pub fn svg_path_data(path: &BezPath) -> String {
    let mut parts = Vec::with_capacity(path.elements().len());
    for el in path.elements() {
        let part = match el {
            PathEl::MoveTo(p) => format!("M {},{}", p.x, p.y),
            PathEl::LineTo(p) => format!("L {},{}", p.x, p.y),
            PathEl::QuadTo(p1, p) => format!("Q {},{} {},{}", p1.x, p1.y, p.x, p.y),
            PathEl::CurveTo(p1, p2, p) => {
                format!("C {},{} {},{} {},{}", p1.x, p1.y, p2.x, p2.y, p.x, p.y)
            }
            PathEl::ClosePath => "Z".to_string(),
        };
        parts.push(part);
    }
    parts.join(" ")
}
