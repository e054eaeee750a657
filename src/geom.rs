use std::ops;

/// Tolerance used for approximate comparisons of coordinates.
pub const EPSILON: f64 = 1e-10;

#[inline]
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// A point or vector in scene space. The y axis points up.
///
/// Equality is approximate: two points compare equal when both coordinates
/// are within [`EPSILON`] of each other.
#[derive(Copy, Clone, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        approx_eq(self.x, 0.0) && approx_eq(self.y, 0.0)
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Rescales the vector to the given length. The zero vector stays zero.
    #[inline]
    pub fn norm(self, length: f64) -> Point {
        let d = self.length();
        if approx_eq(d, 0.0) {
            return Point::new(0.0, 0.0);
        }
        (length / d) * self
    }

    /// Counter-clockwise perpendicular.
    #[inline]
    pub fn rot90_ccw(self) -> Point {
        Point::new(-self.y, self.x)
    }

    #[inline]
    pub fn rot90_cw(self) -> Point {
        Point::new(self.y, -self.x)
    }

    /// Rotates around `pivot` by `degrees`, counter-clockwise.
    pub fn rotate(self, degrees: f64, pivot: Point) -> Point {
        Mat2x2::rotate(degrees.to_radians()) * (self - pivot) + pivot
    }

    /// Angle of the vector in radians, in `(-π, π]`.
    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    #[inline]
    pub fn lerp(t: f64, a: Point, b: Point) -> Point {
        (1.0 - t) * a + t * b
    }

    #[inline]
    pub fn interpolate(self, other: Point, t: f64) -> Point {
        Point::lerp(t, self, other)
    }

    #[inline]
    pub fn min(self, other: Point) -> Point {
        Point {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    #[inline]
    pub fn max(self, other: Point) -> Point {
        Point {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Point) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y)
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Point {
        Point::new(x, y)
    }
}

impl ops::Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point { x: -self.x, y: -self.y }
    }
}

impl ops::Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl ops::AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, other: Point) {
        *self = *self + other;
    }
}

impl ops::Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl ops::SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, other: Point) {
        *self = *self - other;
    }
}

impl ops::Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl ops::Mul<Point> for f64 {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: Point) -> Point {
        Point {
            x: self * rhs.x,
            y: self * rhs.y,
        }
    }
}

impl ops::MulAssign<f64> for Point {
    #[inline]
    fn mul_assign(&mut self, other: f64) {
        *self = *self * other;
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat2x2(pub [f64; 4]);

impl Mat2x2 {
    /* row-major order */
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Mat2x2 {
        Mat2x2([a, b, c, d])
    }

    pub fn id() -> Mat2x2 {
        Mat2x2([1.0, 0.0, 0.0, 1.0])
    }

    pub fn scale(sx: f64, sy: f64) -> Mat2x2 {
        Mat2x2([sx, 0.0, 0.0, sy])
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotate(angle: f64) -> Mat2x2 {
        let (sin, cos) = angle.sin_cos();
        Mat2x2([cos, -sin, sin, cos])
    }

    pub fn determinant(&self) -> f64 {
        self.0[0] * self.0[3] - self.0[1] * self.0[2]
    }

    /// Singular value decomposition `M = R(φ) · diag(σ1, σ2) · Vᵀ`.
    ///
    /// Returns `(φ, σ1, σ2)` with `σ1 >= σ2 >= 0`. Only the left rotation
    /// is needed for mapping ellipses, so `V` is not returned.
    pub fn svd(&self) -> (f64, f64, f64) {
        let [a, b, c, d] = self.0;
        let e = 0.5 * (a + d);
        let f = 0.5 * (a - d);
        let g = 0.5 * (c + b);
        let h = 0.5 * (c - b);
        let q = (e * e + h * h).sqrt();
        let r = (f * f + g * g).sqrt();
        let a1 = g.atan2(f);
        let a2 = h.atan2(e);
        let phi = 0.5 * (a2 + a1);
        (phi, q + r, (q - r).abs())
    }
}

impl ops::Mul<Mat2x2> for Mat2x2 {
    type Output = Mat2x2;
    #[inline]
    fn mul(self, rhs: Mat2x2) -> Mat2x2 {
        Mat2x2([
            self.0[0] * rhs.0[0] + self.0[1] * rhs.0[2],
            self.0[0] * rhs.0[1] + self.0[1] * rhs.0[3],
            self.0[2] * rhs.0[0] + self.0[3] * rhs.0[2],
            self.0[2] * rhs.0[1] + self.0[3] * rhs.0[3],
        ])
    }
}

impl ops::Mul<Point> for Mat2x2 {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: Point) -> Point {
        Point {
            x: self.0[0] * rhs.x + self.0[1] * rhs.y,
            y: self.0[2] * rhs.x + self.0[3] * rhs.y,
        }
    }
}

impl ops::Mul<Mat2x2> for f64 {
    type Output = Mat2x2;
    #[inline]
    fn mul(self, rhs: Mat2x2) -> Mat2x2 {
        Mat2x2([self * rhs.0[0], self * rhs.0[1], self * rhs.0[2], self * rhs.0[3]])
    }
}

/// An affine map: linear part followed by a translation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub matrix: Mat2x2,
    pub offset: Point,
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::id()
    }
}

impl Transform {
    pub fn id() -> Transform {
        Transform {
            matrix: Mat2x2::id(),
            offset: Point::new(0.0, 0.0),
        }
    }

    pub fn new(matrix: Mat2x2, offset: Point) -> Transform {
        Transform { matrix, offset }
    }

    pub fn translate(dx: f64, dy: f64) -> Transform {
        Transform::new(Mat2x2::id(), Point::new(dx, dy))
    }

    pub fn scale(sx: f64, sy: f64) -> Transform {
        Transform::new(Mat2x2::scale(sx, sy), Point::new(0.0, 0.0))
    }

    /// Counter-clockwise rotation by `degrees` around `pivot`.
    pub fn rotate(degrees: f64, pivot: Point) -> Transform {
        let matrix = Mat2x2::rotate(degrees.to_radians());
        Transform::new(matrix, pivot - matrix * pivot)
    }

    /// Composition applying `self` first and `next` second.
    pub fn then(self, next: Transform) -> Transform {
        Transform {
            matrix: next.matrix * self.matrix,
            offset: next.matrix * self.offset + next.offset,
        }
    }

    #[inline]
    pub fn apply(&self, point: Point) -> Point {
        self.matrix * point + self.offset
    }

    pub fn is_identity(&self) -> bool {
        let m = self.matrix.0;
        approx_eq(m[0], 1.0)
            && approx_eq(m[1], 0.0)
            && approx_eq(m[2], 0.0)
            && approx_eq(m[3], 1.0)
            && self.offset.is_zero()
    }

    /// Whether the map flips orientation (mirrors).
    pub fn is_flipping(&self) -> bool {
        self.matrix.determinant() < 0.0
    }

    /// Coefficients in the `[a b c d e f]` order used by SVG and PDF, where
    /// `x' = a·x + c·y + e` and `y' = b·x + d·y + f`.
    pub fn coefficients(&self) -> [f64; 6] {
        let m = self.matrix.0;
        [m[0], m[2], m[1], m[3], self.offset.x, self.offset.y]
    }
}

/// An axis-aligned box with its origin at the minimum corner.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect { x, y, w, h }
    }

    pub fn from_points(a: Point, b: Point) -> Rect {
        let min = a.min(b);
        let max = a.max(b);
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.w, self.y + self.h)
    }

    pub fn extend(&self, point: Point) -> Rect {
        Rect::from_points(self.min().min(point), self.max().max(point))
    }

    pub fn union(&self, other: Rect) -> Rect {
        Rect::from_points(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.x + self.w && point.y >= self.y && point.y <= self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p.length(), 5.0);
        assert_eq!(p + Point::new(1.0, 1.0), Point::new(4.0, 5.0));
        assert_eq!(p - Point::new(1.0, 1.0), Point::new(2.0, 3.0));
        assert_eq!(-p, Point::new(-3.0, -4.0));
        assert_eq!(p.dot(Point::new(1.0, 0.0)), 3.0);
        assert_eq!(p.norm(10.0), Point::new(6.0, 8.0));
        assert_eq!(Point::new(0.0, 0.0).norm(1.0), Point::new(0.0, 0.0));
        assert_eq!(p.interpolate(Point::new(5.0, 6.0), 0.5), Point::new(4.0, 5.0));
    }

    #[test]
    fn approximate_equality() {
        assert_eq!(Point::new(1.0, 1.0), Point::new(1.0 + 1e-12, 1.0 - 1e-12));
        assert_ne!(Point::new(1.0, 1.0), Point::new(1.0 + 1e-6, 1.0));
        assert!(Point::new(1e-12, -1e-12).is_zero());
    }

    #[test]
    fn rotation_about_pivot() {
        let p = Point::new(2.0, 1.0).rotate(90.0, Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(1.0, 2.0));
        assert_eq!(Point::new(1.0, 0.0).rot90_ccw(), Point::new(0.0, 1.0));
        assert_eq!(Point::new(1.0, 0.0).rot90_cw(), Point::new(0.0, -1.0));
    }

    #[test]
    fn transform_composition() {
        let t = Transform::translate(1.0, 2.0).then(Transform::scale(2.0, -1.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(4.0, -3.0));
        assert!(t.is_flipping());
        assert!(Transform::id().is_identity());
        let r = Transform::rotate(90.0, Point::new(1.0, 1.0));
        assert_eq!(r.apply(Point::new(2.0, 1.0)), Point::new(1.0, 2.0));
    }

    #[test]
    fn coefficients_in_pdf_order() {
        let t = Transform::new(Mat2x2([1.0, 2.0, 3.0, 4.0]), Point::new(5.0, 6.0));
        let [a, b, c, d, e, f] = t.coefficients();
        let p = Point::new(7.0, 11.0);
        assert_eq!(t.apply(p), Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f));
        assert_eq!(t.coefficients(), [1.0, 3.0, 2.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn svd_of_rotated_scale() {
        let m = Mat2x2::rotate(0.3) * Mat2x2::scale(3.0, 2.0);
        let (phi, s1, s2) = m.svd();
        assert!((s1 - 3.0).abs() < 1e-9);
        assert!((s2 - 2.0).abs() < 1e-9);
        assert!((phi - 0.3).abs() < 1e-9);
    }

    #[test]
    fn rect_union_and_extend() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0).extend(Point::new(-1.0, 3.0));
        assert_eq!(r, Rect::new(-1.0, 0.0, 2.0, 3.0));
        let u = r.union(Rect::new(5.0, 5.0, 1.0, 1.0));
        assert_eq!(u, Rect::new(-1.0, 0.0, 7.0, 6.0));
        assert!(u.contains(Point::new(0.0, 0.0)));
    }
}
