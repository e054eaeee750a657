//! Elliptical arcs in SVG endpoint form and their centre parameterisation.
//!
//! The conversion follows the SVG arc implementation notes: radii too small
//! to reach the endpoint are scaled up uniformly, and a zero radius turns the
//! arc into a straight line.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::geom::*;

/// An arc in centre form: `center + R(phi) · (rx·cos t, ry·sin t)` for `t`
/// running from `theta` to `theta + delta`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CenterArc {
    pub center: Point,
    pub rx: f64,
    pub ry: f64,
    pub phi: f64,
    pub theta: f64,
    pub delta: f64,
}

impl CenterArc {
    /// Returns `None` when the arc degenerates to a line (coincident
    /// endpoints or a zero radius).
    pub fn from_endpoints(
        from: Point,
        to: Point,
        radii: Point,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
    ) -> Option<CenterArc> {
        let mut rx = radii.x.abs();
        let mut ry = radii.y.abs();
        if from == to || approx_eq(rx, 0.0) || approx_eq(ry, 0.0) {
            return None;
        }
        let phi = rotation.to_radians();

        let p = Mat2x2::rotate(-phi) * (0.5 * (from - to));
        let lambda = (p.x / rx).powi(2) + (p.y / ry).powi(2);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = rx * rx * ry * ry - rx * rx * p.y * p.y - ry * ry * p.x * p.x;
        let den = rx * rx * p.y * p.y + ry * ry * p.x * p.x;
        let mut coef = (num / den).max(0.0).sqrt();
        if large_arc == sweep {
            coef = -coef;
        }
        let c = Point::new(coef * rx * p.y / ry, -coef * ry * p.x / rx);
        let center = Mat2x2::rotate(phi) * c + 0.5 * (from + to);

        let u = Point::new((p.x - c.x) / rx, (p.y - c.y) / ry);
        let v = Point::new((-p.x - c.x) / rx, (-p.y - c.y) / ry);
        let theta = u.angle();
        let mut delta = u.cross(v).atan2(u.dot(v));
        if !sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        } else if sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }

        Some(CenterArc { center, rx, ry, phi, theta, delta })
    }

    pub fn point_at(&self, t: f64) -> Point {
        let (sin, cos) = t.sin_cos();
        self.center + Mat2x2::rotate(self.phi) * Point::new(self.rx * cos, self.ry * sin)
    }

    fn derivative_at(&self, t: f64) -> Point {
        let (sin, cos) = t.sin_cos();
        Mat2x2::rotate(self.phi) * Point::new(-self.rx * sin, self.ry * cos)
    }

    fn contains_angle(&self, t: f64) -> bool {
        let offset = if self.delta >= 0.0 {
            (t - self.theta).rem_euclid(2.0 * PI)
        } else {
            (self.theta - t).rem_euclid(2.0 * PI)
        };
        offset <= self.delta.abs()
    }

    /// Extends `rect` by the arc's endpoints and its axis extrema.
    pub fn bounds(&self, rect: Rect) -> Rect {
        let (sin, cos) = self.phi.sin_cos();
        let tx = (-self.ry * sin).atan2(self.rx * cos);
        let ty = (self.ry * cos).atan2(self.rx * sin);
        let mut rect = rect
            .extend(self.point_at(self.theta))
            .extend(self.point_at(self.theta + self.delta));
        for t in [tx, tx + PI, ty, ty + PI] {
            if self.contains_angle(t) {
                rect = rect.extend(self.point_at(t));
            }
        }
        rect
    }

    /// Number of chords needed to stay within `tolerance` of the arc.
    pub fn chord_count(&self, tolerance: f64) -> usize {
        let r = self.rx.max(self.ry);
        let step = if tolerance >= r {
            FRAC_PI_2
        } else {
            (2.0 * (1.0 - tolerance / r).acos()).min(FRAC_PI_2)
        };
        ((self.delta.abs() / step).ceil() as usize).clamp(1, 4096)
    }

    /// Samples the arc, excluding the start point.
    pub fn flatten(&self, tolerance: f64, out: &mut Vec<Point>) {
        let n = self.chord_count(tolerance);
        for i in 1..n {
            out.push(self.point_at(self.theta + self.delta * i as f64 / n as f64));
        }
        out.push(self.point_at(self.theta + self.delta));
    }

    /// Approximates the arc by cubic Béziers spanning at most 90° each.
    /// Returns `(control1, control2, end)` triples.
    pub fn to_cubics(&self) -> Vec<(Point, Point, Point)> {
        let n = ((self.delta.abs() / FRAC_PI_2 - 1e-9).ceil() as usize).max(1);
        let dt = self.delta / n as f64;
        let k = 4.0 / 3.0 * (dt / 4.0).tan();
        (0..n)
            .map(|i| {
                let t0 = self.theta + dt * i as f64;
                let t1 = t0 + dt;
                let p0 = self.point_at(t0);
                let p3 = self.point_at(t1);
                (p0 + k * self.derivative_at(t0), p3 - k * self.derivative_at(t1), p3)
            })
            .collect()
    }
}

/// Maps an arc's shape parameters through the linear part of an affine
/// transform. Returns the new `(radii, rotation in degrees, sweep)`.
///
/// The image of an ellipse under a linear map is again an ellipse whose
/// axes are the singular vectors of `A · R(φ) · diag(rx, ry)`; mirroring
/// maps reverse the direction of travel.
pub(crate) fn transform_arc(matrix: Mat2x2, radii: Point, rotation: f64, sweep: bool) -> (Point, f64, bool) {
    let shape = matrix * Mat2x2::rotate(rotation.to_radians()) * Mat2x2::scale(radii.x.abs(), radii.y.abs());
    let (phi, s1, s2) = shape.svd();
    let sweep = if matrix.determinant() < 0.0 { !sweep } else { sweep };
    (Point::new(s1, s2), phi.to_degrees(), sweep)
}
