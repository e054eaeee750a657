use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::flatten::Polyline;
use crate::geom::*;
use crate::path::{Path, DEFAULT_TOLERANCE};

/// Points closer than this are merged before offsetting.
const MERGE_DISTANCE: f64 = 1e-9;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// How a path is painted as a line.
///
/// `miter_limit` is the maximum ratio of miter length to stroke width, as
/// in SVG; sharper corners are beveled. An empty `dashes` array draws a
/// solid line.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dashes: Vec<f64>,
    pub dash_offset: f64,
}

impl Default for StrokeStyle {
    fn default() -> StrokeStyle {
        StrokeStyle {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dashes: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    pub fn new(width: f64) -> StrokeStyle {
        StrokeStyle { width, ..StrokeStyle::default() }
    }

    pub fn cap(mut self, cap: LineCap) -> StrokeStyle {
        self.cap = cap;
        self
    }

    pub fn join(mut self, join: LineJoin) -> StrokeStyle {
        self.join = join;
        self
    }

    pub fn miter_limit(mut self, limit: f64) -> StrokeStyle {
        self.miter_limit = limit;
        self
    }

    pub fn dashes(mut self, dashes: &[f64], offset: f64) -> StrokeStyle {
        self.dashes = dashes.to_vec();
        self.dash_offset = offset;
        self
    }

    /// The dash array as actually applied, or `None` for a solid line.
    ///
    /// Arrays with a negative entry or a non-positive sum are ignored, and
    /// odd-length arrays are repeated to make them even.
    pub fn dash_pattern(&self) -> Option<Vec<f64>> {
        normalize_dashes(&self.dashes)
    }
}

fn normalize_dashes(dashes: &[f64]) -> Option<Vec<f64>> {
    if dashes.is_empty() || dashes.iter().any(|d| *d < 0.0 || !d.is_finite()) {
        return None;
    }
    if dashes.iter().sum::<f64>() <= EPSILON {
        return None;
    }
    let mut pattern = dashes.to_vec();
    if pattern.len() % 2 == 1 {
        pattern.extend_from_slice(dashes);
    }
    Some(pattern)
}

/// Converts paths into fillable outlines.
pub struct Stroker<'a> {
    style: &'a StrokeStyle,
    tolerance: f64,
}

impl<'a> Stroker<'a> {
    pub fn new(style: &'a StrokeStyle) -> Stroker<'a> {
        Stroker { style, tolerance: DEFAULT_TOLERANCE }
    }

    /// Maximum distance between the produced outline and the exact one.
    pub fn tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.tolerance = tolerance.max(EPSILON);
        self
    }

    pub fn stroke(&self, path: &Path) -> Path {
        Path::from_polylines(&self.stroke_polylines(&path.flatten(self.tolerance)))
    }

    /// Outlines already flattened geometry. Every returned polyline is
    /// closed, and the union of their nonzero-winding interiors is the
    /// stroked region.
    pub fn stroke_polylines(&self, polylines: &[Polyline]) -> Vec<Polyline> {
        let hw = 0.5 * self.style.width;
        if !hw.is_finite() || hw <= 0.0 {
            log::trace!("skipping stroke with non-positive width {}", self.style.width);
            return Vec::new();
        }

        let dashed;
        let polylines = match self.style.dash_pattern() {
            Some(pattern) => {
                dashed = dash_polylines(polylines, &pattern, self.style.dash_offset);
                &dashed[..]
            }
            None => polylines,
        };

        let mut outlines = Vec::new();
        for polyline in polylines {
            if !is_finite(polyline) {
                log::trace!("skipping sub-path with non-finite coordinates");
                continue;
            }
            let points = merge_points(&polyline.points, polyline.closed);
            if points.len() < 2 {
                log::trace!("skipping degenerate sub-path with {} distinct points", points.len());
                continue;
            }
            let outline = Outline { style: self.style, hw, tolerance: self.tolerance };
            if polyline.closed && points.len() > 2 {
                outlines.push(outline.closed_side(&points));
                let reversed: Vec<Point> = points.iter().rev().copied().collect();
                outlines.push(outline.closed_side(&reversed));
            } else if polyline.closed {
                // Out and back along one segment: a single contour turning
                // at both ends, no caps.
                outlines.push(outline.closed_side(&points));
            } else {
                outlines.push(outline.open(&points));
            }
        }
        outlines
    }
}

impl Path {
    /// Outline of this path painted with `style`, at the default tolerance.
    pub fn stroke(&self, style: &StrokeStyle) -> Path {
        Stroker::new(style).stroke(self)
    }

    /// Splits the path into its "on" intervals. The pattern starts
    /// `offset` units in and restarts on every sub-path.
    pub fn dash(&self, offset: f64, pattern: &[f64]) -> Path {
        let polylines = self.flatten(DEFAULT_TOLERANCE);
        match normalize_dashes(pattern) {
            Some(pattern) => Path::from_polylines(&dash_polylines(&polylines, &pattern, offset)),
            None => Path::from_polylines(&polylines),
        }
    }
}

fn is_finite(polyline: &Polyline) -> bool {
    polyline.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
}

fn merge_points(points: &[Point], closed: bool) -> Vec<Point> {
    let mut merged: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        match merged.last() {
            Some(last) if last.distance(p) <= MERGE_DISTANCE => {}
            _ => merged.push(p),
        }
    }
    if closed {
        while merged.len() > 1 && merged[0].distance(merged[merged.len() - 1]) <= MERGE_DISTANCE {
            merged.pop();
        }
    }
    merged
}

struct Outline<'a> {
    style: &'a StrokeStyle,
    hw: f64,
    tolerance: f64,
}

impl<'a> Outline<'a> {
    /// Angle between consecutive points on a circle of radius `hw`.
    fn arc_step(&self) -> f64 {
        if self.tolerance >= self.hw {
            FRAC_PI_2
        } else {
            (2.0 * (1.0 - self.tolerance / self.hw).acos()).clamp(1e-3, FRAC_PI_2)
        }
    }

    /// Appends `pivot + normal` rotated through `angle` radians, excluding
    /// both end points.
    fn arc(&self, pivot: Point, normal: Point, angle: f64, steps: usize, out: &mut Vec<Point>) {
        for i in 1..steps {
            let t = angle * i as f64 / steps as f64;
            out.push(pivot + Mat2x2::rotate(t) * normal);
        }
    }

    /// Connects the left offsets of `a -> v` and `v -> b` at the vertex `v`.
    fn join(&self, a: Point, v: Point, b: Point, out: &mut Vec<Point>) {
        let d0 = (v - a).norm(1.0);
        let d1 = (b - v).norm(1.0);
        let n0 = self.hw * d0.rot90_ccw();
        let n1 = self.hw * d1.rot90_ccw();
        let cross = d0.cross(d1);
        let cos = d0.dot(d1);

        if cross.abs() <= 1e-12 && cos > 0.0 {
            out.push(v + n0);
            return;
        }

        if cross > 0.0 {
            // Inner corner: use the offset intersection when it lies on both
            // offset segments, otherwise route through the vertex.
            let overlap = self.hw * ((1.0 - cos) / (1.0 + cos)).sqrt();
            if overlap <= v.distance(a) && overlap <= v.distance(b) {
                out.push(v + (1.0 / (1.0 + cos)) * (n0 + n1));
            } else {
                out.push(v + n0);
                out.push(v);
                out.push(v + n1);
            }
            return;
        }

        out.push(v + n0);
        match self.style.join {
            LineJoin::Miter => {
                if 1.0 + cos > EPSILON && (2.0 / (1.0 + cos)).sqrt() <= self.style.miter_limit {
                    out.push(v + (1.0 / (1.0 + cos)) * (n0 + n1));
                }
            }
            LineJoin::Round => {
                let mut angle = n0.cross(n1).atan2(n0.dot(n1));
                if angle > 0.0 {
                    angle -= 2.0 * PI;
                }
                let steps = (angle.abs() / self.arc_step()).ceil().max(1.0) as usize;
                self.arc(v, n0, angle, steps, out);
            }
            LineJoin::Bevel => {}
        }
        out.push(v + n1);
    }

    /// Cap at `end`, travelling in `direction`, from the left offset to
    /// the right offset.
    fn cap(&self, end: Point, direction: Point, out: &mut Vec<Point>) {
        let d = self.hw * direction.norm(1.0);
        let n = d.rot90_ccw();
        match self.style.cap {
            LineCap::Butt => {}
            LineCap::Square => {
                out.push(end + n + d);
                out.push(end - n + d);
            }
            LineCap::Round => {
                let mut steps = (PI / self.arc_step()).ceil().max(2.0) as usize;
                if steps % 2 == 1 {
                    steps += 1;
                }
                self.arc(end, n, -PI, steps, out);
            }
        }
    }

    /// Left side of an open polyline followed by the end cap, the left side
    /// of the reversed polyline and the start cap.
    fn open(&self, points: &[Point]) -> Polyline {
        let mut out = Vec::new();
        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        for side in [points, &reversed[..]] {
            let n = side.len();
            let first_normal = self.hw * (side[1] - side[0]).norm(1.0).rot90_ccw();
            out.push(side[0] + first_normal);
            for i in 1..n - 1 {
                self.join(side[i - 1], side[i], side[i + 1], &mut out);
            }
            let last_normal = self.hw * (side[n - 1] - side[n - 2]).norm(1.0).rot90_ccw();
            out.push(side[n - 1] + last_normal);
            self.cap(side[n - 1], side[n - 1] - side[n - 2], &mut out);
        }
        Polyline { points: out, closed: true }
    }

    /// Left side of a closed polyline, joined at every vertex.
    fn closed_side(&self, points: &[Point]) -> Polyline {
        let n = points.len();
        let mut out = Vec::new();
        for i in 0..n {
            self.join(points[(i + n - 1) % n], points[i], points[(i + 1) % n], &mut out);
        }
        Polyline { points: out, closed: true }
    }
}

/// Cuts polylines into the "on" intervals of `pattern`, which must be
/// normalized (even length, non-negative, positive sum).
fn dash_polylines(polylines: &[Polyline], pattern: &[f64], offset: f64) -> Vec<Polyline> {
    let total: f64 = pattern.iter().sum();
    let mut dashes = Vec::new();

    for polyline in polylines {
        let mut points = polyline.points.clone();
        if polyline.closed {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }
        if points.len() < 2 || !is_finite(polyline) {
            continue;
        }

        let mut index = 0;
        let mut remaining = offset.rem_euclid(total);
        if remaining >= total {
            remaining = 0.0;
        }
        while remaining >= pattern[index] {
            remaining -= pattern[index];
            index = (index + 1) % pattern.len();
        }
        remaining = pattern[index] - remaining;
        let starts_on = index % 2 == 0;

        let mut pieces: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = if starts_on { vec![points[0]] } else { Vec::new() };
        for w in points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let length = a.distance(b);
            let mut t = 0.0;
            while length - t > remaining {
                t += remaining;
                let p = Point::lerp(t / length, a, b);
                if index % 2 == 0 {
                    current.push(p);
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current.push(p);
                }
                index = (index + 1) % pattern.len();
                remaining = pattern[index];
            }
            remaining -= length - t;
            if index % 2 == 0 {
                current.push(b);
            }
        }
        let ends_on = index % 2 == 0;
        if ends_on && !current.is_empty() {
            pieces.push(current);
        }

        if polyline.closed && starts_on && ends_on && pieces.len() > 1 {
            let first = pieces.remove(0);
            if let Some(last) = pieces.last_mut() {
                last.extend_from_slice(&first[1..]);
            }
        }

        dashes.extend(pieces.into_iter().map(|points| Polyline { points, closed: false }));
    }
    dashes
}
