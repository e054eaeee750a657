use crate::arc::CenterArc;
use crate::geom::*;
use crate::path::{Path, PathBuilder, PathCmd};

/// Subdivision depth after which a curve piece is accepted as flat.
pub const MAX_DEPTH: u32 = 16;

/// A flattened sub-path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Polyline {
    /// Arc length, including the closing segment of closed polylines.
    pub fn length(&self) -> f64 {
        let open: f64 = self.points.windows(2).map(|w| w[0].distance(w[1])).sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) => open + last.distance(first),
            _ => open,
        }
    }
}

impl Path {
    /// Path made of straight segments through each polyline's points.
    pub fn from_polylines(polylines: &[Polyline]) -> Path {
        let mut builder = PathBuilder::new();
        for polyline in polylines {
            let mut points = polyline.points.iter();
            let Some(&first) = points.next() else { continue };
            builder.move_to(first);
            for &p in points {
                builder.line_to(p);
            }
            if polyline.closed {
                builder.close();
            }
        }
        builder.build()
    }
}

/// Appends points approximating the cubic `p0 p1 p2 p3` to `out`, excluding
/// `p0`.
///
/// Pieces are split in half until the control polygon lies within
/// `tolerance` of the chord, using an explicit stack so the depth stays
/// bounded by [`MAX_DEPTH`].
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f64, out: &mut Vec<Point>) {
    let limit = 16.0 * tolerance * tolerance;
    let mut stack = vec![([p0, p1, p2, p3], 0)];
    while let Some(([p0, p1, p2, p3], depth)) = stack.pop() {
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        let flatness = (u.x * u.x).max(v.x * v.x) + (u.y * u.y).max(v.y * v.y);
        if flatness <= limit || depth >= MAX_DEPTH {
            out.push(p3);
            continue;
        }

        let p01 = Point::lerp(0.5, p0, p1);
        let p12 = Point::lerp(0.5, p1, p2);
        let p23 = Point::lerp(0.5, p2, p3);
        let p012 = Point::lerp(0.5, p01, p12);
        let p123 = Point::lerp(0.5, p12, p23);
        let mid = Point::lerp(0.5, p012, p123);

        stack.push(([mid, p123, p23, p3], depth + 1));
        stack.push(([p0, p01, p012, mid], depth + 1));
    }
}

pub fn flatten_quadratic(p0: Point, p1: Point, p2: Point, tolerance: f64, out: &mut Vec<Point>) {
    let c1 = p0 + (2.0 / 3.0) * (p1 - p0);
    let c2 = p2 + (2.0 / 3.0) * (p1 - p2);
    flatten_cubic(p0, c1, c2, p2, tolerance, out);
}

impl PathCmd {
    /// Appends the flattened points of this command starting at `current`.
    /// Moves and closes produce nothing.
    pub(crate) fn flatten_from(&self, current: Point, tolerance: f64, out: &mut Vec<Point>) {
        match *self {
            PathCmd::Move(_) | PathCmd::Close => {}
            PathCmd::Line(p) => out.push(p),
            PathCmd::Quadratic(c, p) => flatten_quadratic(current, c, p, tolerance, out),
            PathCmd::Cubic(c1, c2, p) => flatten_cubic(current, c1, c2, p, tolerance, out),
            PathCmd::Arc { radii, rotation, large_arc, sweep, to } => {
                match CenterArc::from_endpoints(current, to, radii, rotation, large_arc, sweep) {
                    Some(arc) => arc.flatten(tolerance, out),
                    None => out.push(to),
                }
            }
        }
    }
}

/// Flattens every sub-path of `path` into a polyline.
///
/// Closed sub-paths do not repeat their first point at the end.
pub fn flatten(path: &Path, tolerance: f64) -> Vec<Polyline> {
    let tolerance = tolerance.max(EPSILON);
    let mut polylines = Vec::new();
    let mut current = Polyline::default();
    let mut last = Point::new(0.0, 0.0);

    for command in path.commands() {
        match *command {
            PathCmd::Move(p) => {
                if current.points.len() > 1 {
                    polylines.push(std::mem::take(&mut current));
                }
                current.points.clear();
                current.points.push(p);
                last = p;
            }
            PathCmd::Close => {
                if current.points.len() > 1 && current.points.first() == current.points.last() {
                    current.points.pop();
                }
                current.closed = true;
                let start = current.points.first().copied().unwrap_or(last);
                polylines.push(std::mem::take(&mut current));
                current.points.push(start);
                last = start;
            }
            _ => {
                command.flatten_from(last, tolerance, &mut current.points);
                last = command.end().unwrap_or(last);
            }
        }
    }
    if current.points.len() > 1 {
        polylines.push(current);
    }
    polylines
}
