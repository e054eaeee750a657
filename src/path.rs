use std::fmt;

use crate::arc::{transform_arc, CenterArc};
use crate::flatten::{flatten, Polyline};
use crate::format::num;
use crate::geom::*;

/// Flattening tolerance used when the caller does not pick one.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// A drawing command. Every command except `Move` continues from the end
/// point of the previous one, so sub-paths always chain continuously.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCmd {
    Move(Point),
    Line(Point),
    Quadratic(Point, Point),
    Cubic(Point, Point, Point),
    /// Elliptical arc in SVG endpoint form. `rotation` is in degrees.
    Arc {
        radii: Point,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    Close,
}

impl PathCmd {
    /// End point of the command; `None` for `Close`, whose end is the
    /// start of the sub-path.
    pub fn end(&self) -> Option<Point> {
        match *self {
            PathCmd::Move(p) | PathCmd::Line(p) | PathCmd::Quadratic(_, p) | PathCmd::Cubic(_, _, p) => Some(p),
            PathCmd::Arc { to, .. } => Some(to),
            PathCmd::Close => None,
        }
    }

    pub fn transform(&self, transform: &Transform) -> PathCmd {
        let t = |p: Point| transform.apply(p);
        match *self {
            PathCmd::Move(p) => PathCmd::Move(t(p)),
            PathCmd::Line(p) => PathCmd::Line(t(p)),
            PathCmd::Quadratic(c, p) => PathCmd::Quadratic(t(c), t(p)),
            PathCmd::Cubic(c1, c2, p) => PathCmd::Cubic(t(c1), t(c2), t(p)),
            PathCmd::Arc { radii, rotation, large_arc, sweep, to } => {
                let (radii, rotation, sweep) = transform_arc(transform.matrix, radii, rotation, sweep);
                PathCmd::Arc { radii, rotation, large_arc, sweep, to: t(to) }
            }
            PathCmd::Close => PathCmd::Close,
        }
    }
}

/// An immutable sequence of sub-paths.
///
/// Built with [`PathBuilder`], parsed from text with [`Path::parse`], or
/// derived from another path. Geometric operations return new paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCmd>,
}

impl Path {
    pub fn new() -> Path {
        Path { commands: Vec::new() }
    }

    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn commands(&self) -> &[PathCmd] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn rectangle(x: f64, y: f64, w: f64, h: f64) -> Path {
        Path::builder()
            .move_to(Point::new(x, y))
            .line_to(Point::new(x + w, y))
            .line_to(Point::new(x + w, y + h))
            .line_to(Point::new(x, y + h))
            .close()
            .build()
    }

    pub fn rounded_rectangle(x: f64, y: f64, w: f64, h: f64, radius: f64) -> Path {
        let radius = radius.abs().min(0.5 * w.abs()).min(0.5 * h.abs());
        if radius <= 0.0 {
            return Path::rectangle(x, y, w, h);
        }
        let rx = radius * w.signum();
        let ry = radius * h.signum();
        let sweep = w * h > 0.0;
        let corner = Point::new(radius, radius);
        Path::builder()
            .move_to(Point::new(x + rx, y))
            .line_to(Point::new(x + w - rx, y))
            .arc_to(corner, 0.0, false, sweep, Point::new(x + w, y + ry))
            .line_to(Point::new(x + w, y + h - ry))
            .arc_to(corner, 0.0, false, sweep, Point::new(x + w - rx, y + h))
            .line_to(Point::new(x + rx, y + h))
            .arc_to(corner, 0.0, false, sweep, Point::new(x, y + h - ry))
            .line_to(Point::new(x, y + ry))
            .arc_to(corner, 0.0, false, sweep, Point::new(x + rx, y))
            .close()
            .build()
    }

    /// Counter-clockwise ellipse made of two arcs, starting at the
    /// rightmost point.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Path {
        let radii = Point::new(rx, ry);
        Path::builder()
            .move_to(Point::new(cx + rx, cy))
            .arc_to(radii, 0.0, false, true, Point::new(cx - rx, cy))
            .arc_to(radii, 0.0, false, true, Point::new(cx + rx, cy))
            .close()
            .build()
    }

    pub fn circle(cx: f64, cy: f64, r: f64) -> Path {
        Path::ellipse(cx, cy, r, r)
    }

    /// Calls `f(from, command)` for each command, where `from` is the
    /// current point before the command runs.
    fn walk(&self, mut f: impl FnMut(Point, &PathCmd)) {
        let mut start = Point::new(0.0, 0.0);
        let mut current = start;
        for command in &self.commands {
            f(current, command);
            match *command {
                PathCmd::Move(p) => {
                    start = p;
                    current = p;
                }
                PathCmd::Close => current = start,
                _ => current = command.end().unwrap_or(current),
            }
        }
    }

    /// Bounding box of the geometry, including curve and arc extrema.
    /// Empty paths have an empty box at the origin.
    pub fn bounds(&self) -> Rect {
        let mut rect: Option<Rect> = None;
        self.walk(|from, command| {
            let r = match rect {
                Some(r) => r,
                None => Rect::new(from.x, from.y, 0.0, 0.0),
            };
            rect = Some(match *command {
                PathCmd::Move(p) => match rect {
                    Some(r) => r.extend(p),
                    None => Rect::new(p.x, p.y, 0.0, 0.0),
                },
                PathCmd::Line(p) => r.extend(p),
                PathCmd::Quadratic(c, p) => quadratic_bounds(r, from, c, p),
                PathCmd::Cubic(c1, c2, p) => cubic_bounds(r, from, c1, c2, p),
                PathCmd::Arc { radii, rotation, large_arc, sweep, to } => {
                    match CenterArc::from_endpoints(from, to, radii, rotation, large_arc, sweep) {
                        Some(arc) => arc.bounds(r),
                        None => r.extend(to),
                    }
                }
                PathCmd::Close => r,
            });
        });
        rect.unwrap_or_default()
    }

    pub fn transform(&self, transform: &Transform) -> Path {
        Path {
            commands: self.commands.iter().map(|c| c.transform(transform)).collect(),
        }
    }

    /// Rotates counter-clockwise by `degrees` around `pivot`.
    pub fn rotate(&self, degrees: f64, pivot: Point) -> Path {
        self.transform(&Transform::rotate(degrees, pivot))
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Path {
        self.transform(&Transform::translate(dx, dy))
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Path {
        self.transform(&Transform::scale(sx, sy))
    }

    pub fn flatten(&self, tolerance: f64) -> Vec<Polyline> {
        flatten(self, tolerance)
    }

    /// Length of the flattened path.
    pub fn length(&self, tolerance: f64) -> f64 {
        self.flatten(tolerance).iter().map(Polyline::length).sum()
    }

    /// Splits the path into one path per sub-path.
    pub fn subpaths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        let mut current = Vec::new();
        self.walk(|from, command| {
            if let PathCmd::Move(_) = command {
                if current.len() > 1 {
                    paths.push(Path { commands: std::mem::take(&mut current) });
                }
                current.clear();
            } else if current.is_empty() {
                current.push(PathCmd::Move(from));
            }
            current.push(*command);
            if let PathCmd::Close = command {
                paths.push(Path { commands: std::mem::take(&mut current) });
            }
        });
        if current.len() > 1 {
            paths.push(Path { commands: current });
        }
        paths
    }

    /// Concatenates the sub-paths of `other` after those of `self`.
    pub fn append(&self, other: &Path) -> Path {
        let mut builder = PathBuilder::from_path(self);
        builder.extend(other);
        builder.build()
    }

    /// The same geometry traversed in the opposite direction.
    pub fn reverse(&self) -> Path {
        let mut builder = PathBuilder::new();
        for subpath in self.subpaths() {
            let mut segments = Vec::new();
            let mut closed = false;
            subpath.walk(|from, command| match *command {
                PathCmd::Move(_) => {}
                PathCmd::Close => closed = true,
                _ => segments.push((from, *command)),
            });
            let start = subpath.commands.first().and_then(PathCmd::end).unwrap_or_default();
            let end = segments.last().and_then(|(_, c)| c.end()).unwrap_or(start);
            let first = if closed { start } else { end };
            builder.move_to(first);
            if closed && end != start {
                builder.line_to(end);
            }
            for &(from, command) in segments.iter().rev() {
                match command {
                    PathCmd::Line(_) => builder.line_to(from),
                    PathCmd::Quadratic(c, _) => builder.quad_to(c, from),
                    PathCmd::Cubic(c1, c2, _) => builder.cubic_to(c2, c1, from),
                    PathCmd::Arc { radii, rotation, large_arc, sweep, .. } => {
                        builder.arc_to(radii, rotation, large_arc, !sweep, from)
                    }
                    PathCmd::Move(_) | PathCmd::Close => &mut builder,
                };
            }
            if closed {
                builder.close();
            }
        }
        builder.build()
    }

    /// Canonical text form using absolute commands only.
    pub fn to_text(&self) -> String {
        self.to_text_with_precision(crate::format::DEFAULT_PRECISION)
    }

    pub fn to_text_with_precision(&self, precision: usize) -> String {
        let n = |v: f64| num(v, precision);
        let mut out = Vec::new();
        for command in &self.commands {
            out.push(match *command {
                PathCmd::Move(p) => format!("M{} {}", n(p.x), n(p.y)),
                PathCmd::Line(p) => format!("L{} {}", n(p.x), n(p.y)),
                PathCmd::Quadratic(c, p) => format!("Q{} {} {} {}", n(c.x), n(c.y), n(p.x), n(p.y)),
                PathCmd::Cubic(c1, c2, p) => {
                    format!("C{} {} {} {} {} {}", n(c1.x), n(c1.y), n(c2.x), n(c2.y), n(p.x), n(p.y))
                }
                PathCmd::Arc { radii, rotation, large_arc, sweep, to } => format!(
                    "A{} {} {} {} {} {} {}",
                    n(radii.x),
                    n(radii.y),
                    n(rotation),
                    large_arc as u8,
                    sweep as u8,
                    n(to.x),
                    n(to.y)
                ),
                PathCmd::Close => "z".to_string(),
            });
        }
        out.join("")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Rect {
    pub fn to_path(&self) -> Path {
        Path::rectangle(self.x, self.y, self.w, self.h)
    }
}

fn quadratic_bounds(rect: Rect, p0: Point, p1: Point, p2: Point) -> Rect {
    let mut rect = rect.extend(p2);
    let denom = p0 - 2.0 * p1 + p2;
    for (d, n) in [(denom.x, p0.x - p1.x), (denom.y, p0.y - p1.y)] {
        if d.abs() > EPSILON {
            let t = n / d;
            if t > 0.0 && t < 1.0 {
                let a = Point::lerp(t, p0, p1);
                let b = Point::lerp(t, p1, p2);
                rect = rect.extend(Point::lerp(t, a, b));
            }
        }
    }
    rect
}

fn cubic_at(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let mt = 1.0 - t;
    (mt * mt * mt) * p0 + (3.0 * mt * mt * t) * p1 + (3.0 * mt * t * t) * p2 + (t * t * t) * p3
}

fn cubic_bounds(rect: Rect, p0: Point, p1: Point, p2: Point, p3: Point) -> Rect {
    let mut rect = rect.extend(p3);
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;
    for (a, b, c) in [(a.x, b.x, c.x), (a.y, b.y, c.y)] {
        for t in quadratic_roots(a, b, c) {
            if t > 0.0 && t < 1.0 {
                rect = rect.extend(cubic_at(t, p0, p1, p2, p3));
            }
        }
    }
    rect
}

/// Real roots of `a·t² + b·t + c`.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    vec![(-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)]
}

/// Incremental construction of a [`Path`].
///
/// Drawing without a preceding move starts at the current point (the
/// origin for a fresh builder, the sub-path start after a close).
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    commands: Vec<PathCmd>,
    start: Point,
    current: Point,
    open: bool,
}

impl PathBuilder {
    pub fn new() -> PathBuilder {
        PathBuilder::default()
    }

    pub fn from_path(path: &Path) -> PathBuilder {
        let mut builder = PathBuilder::new();
        builder.extend(path);
        builder
    }

    /// Appends every command of `path`, starting a new sub-path.
    pub fn extend(&mut self, path: &Path) -> &mut Self {
        for command in path.commands() {
            match *command {
                PathCmd::Move(p) => self.move_to(p),
                PathCmd::Close => self.close(),
                other => self.push(other),
            };
        }
        self
    }

    pub fn current(&self) -> Point {
        self.current
    }

    fn ensure_open(&mut self) {
        if !self.open {
            self.commands.push(PathCmd::Move(self.current));
            self.start = self.current;
            self.open = true;
        }
    }

    fn push(&mut self, command: PathCmd) -> &mut Self {
        self.ensure_open();
        if let Some(end) = command.end() {
            self.current = end;
        }
        self.commands.push(command);
        self
    }

    pub fn move_to(&mut self, point: Point) -> &mut Self {
        if let Some(PathCmd::Move(last)) = self.commands.last_mut() {
            *last = point;
        } else {
            self.commands.push(PathCmd::Move(point));
        }
        self.start = point;
        self.current = point;
        self.open = true;
        self
    }

    pub fn line_to(&mut self, point: Point) -> &mut Self {
        self.push(PathCmd::Line(point))
    }

    pub fn quad_to(&mut self, control: Point, point: Point) -> &mut Self {
        self.push(PathCmd::Quadratic(control, point))
    }

    /// Quadratic whose control point mirrors the previous one.
    pub fn quad_smooth_to(&mut self, point: Point) -> &mut Self {
        let control = match (self.open, self.commands.last()) {
            (true, Some(&PathCmd::Quadratic(c, p))) => 2.0 * p - c,
            _ => self.current,
        };
        self.quad_to(control, point)
    }

    pub fn cubic_to(&mut self, control1: Point, control2: Point, point: Point) -> &mut Self {
        self.push(PathCmd::Cubic(control1, control2, point))
    }

    /// Cubic whose first control point mirrors the previous second one.
    pub fn cubic_smooth_to(&mut self, control2: Point, point: Point) -> &mut Self {
        let control1 = match (self.open, self.commands.last()) {
            (true, Some(&PathCmd::Cubic(_, c2, p))) => 2.0 * p - c2,
            _ => self.current,
        };
        self.cubic_to(control1, control2, point)
    }

    pub fn arc_to(&mut self, radii: Point, rotation: f64, large_arc: bool, sweep: bool, point: Point) -> &mut Self {
        self.push(PathCmd::Arc { radii, rotation, large_arc, sweep, to: point })
    }

    /// Closes the current sub-path. Closing an empty sub-path does nothing.
    pub fn close(&mut self) -> &mut Self {
        if let Some(PathCmd::Move(_)) = self.commands.last() {
            self.commands.pop();
            self.open = false;
            return self;
        }
        if self.open {
            self.commands.push(PathCmd::Close);
            self.current = self.start;
            self.open = false;
        }
        self
    }

    pub fn build(&mut self) -> Path {
        let mut commands = std::mem::take(&mut self.commands);
        if let Some(PathCmd::Move(_)) = commands.last() {
            commands.pop();
        }
        self.open = false;
        Path { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_close {
        ($a:expr, $b:expr, $tol:expr) => {{
            let (a, b) = ($a, $b);
            assert!((a - b).abs() <= $tol, "{} is not within {} of {}", a, $tol, b);
        }};
    }

    #[test]
    fn rectangle_bounds() {
        let r = Path::rectangle(1.0, 2.0, 3.0, 4.0).bounds();
        assert_eq!(r, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(Rect::new(1.0, 2.0, 3.0, 4.0).to_path().bounds(), r);
    }

    #[test]
    fn cubic_bounds_include_extrema() {
        let path = Path::builder()
            .move_to(Point::new(0.0, 0.0))
            .cubic_to(Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0))
            .build();
        let r = path.bounds();
        assert_close!(r.h, 7.5, 1e-9);
        assert_close!(r.w, 10.0, 1e-9);
    }

    #[test]
    fn quadratic_bounds_include_extremum() {
        let path = Path::builder()
            .move_to(Point::new(0.0, 0.0))
            .quad_to(Point::new(5.0, 10.0), Point::new(10.0, 0.0))
            .build();
        assert_close!(path.bounds().h, 5.0, 1e-9);
    }

    #[test]
    fn circle_bounds() {
        let r = Path::circle(1.0, 1.0, 2.0).bounds();
        assert_close!(r.x, -1.0, 1e-9);
        assert_close!(r.y, -1.0, 1e-9);
        assert_close!(r.w, 4.0, 1e-9);
        assert_close!(r.h, 4.0, 1e-9);
    }

    #[test]
    fn identity_transform_preserves_path() {
        let path = Path::rounded_rectangle(0.0, 0.0, 10.0, 5.0, 1.0);
        assert_eq!(path.transform(&Transform::id()), path);
    }

    #[test]
    fn rotation_preserves_arc_geometry() {
        let path = Path::ellipse(0.0, 0.0, 4.0, 2.0);
        let rotated = path.rotate(90.0, Point::new(0.0, 0.0));
        let r = rotated.bounds();
        assert_close!(r.w, 4.0, 1e-9);
        assert_close!(r.h, 8.0, 1e-9);
    }

    #[test]
    fn scaling_rotated_ellipse_matches_flattened_points() {
        let path = Path::ellipse(0.0, 0.0, 4.0, 2.0).rotate(30.0, Point::new(0.0, 0.0));
        let scale = Transform::scale(2.0, 0.5);
        let exact = path.transform(&scale).bounds();
        let mut sampled: Option<Rect> = None;
        for polyline in path.flatten(0.0001) {
            for p in polyline.points {
                let q = scale.apply(p);
                sampled = Some(match sampled {
                    Some(r) => r.extend(q),
                    None => Rect::new(q.x, q.y, 0.0, 0.0),
                });
            }
        }
        let sampled = sampled.unwrap();
        assert_close!(exact.w, sampled.w, 0.01);
        assert_close!(exact.h, sampled.h, 0.01);
    }

    #[test]
    fn mirrored_arc_keeps_its_side() {
        let path = Path::builder()
            .move_to(Point::new(0.0, 0.0))
            .arc_to(Point::new(1.0, 1.0), 0.0, false, true, Point::new(2.0, 0.0))
            .build();
        let before = path.bounds();
        let after = path.scale(1.0, -1.0).bounds();
        assert_close!(before.y, -after.max().y, 1e-9);
        assert_close!(before.max().y, -after.y, 1e-9);
    }

    #[test]
    fn translate_moves_bounds() {
        let r = Path::rectangle(0.0, 0.0, 1.0, 1.0).translate(2.0, 3.0).bounds();
        assert_eq!(r, Rect::new(2.0, 3.0, 1.0, 1.0));
    }

    #[test]
    fn builder_implicit_move_and_close() {
        let path = Path::builder()
            .line_to(Point::new(1.0, 0.0))
            .close()
            .line_to(Point::new(0.0, 1.0))
            .build();
        assert_eq!(
            path.commands(),
            &[
                PathCmd::Move(Point::new(0.0, 0.0)),
                PathCmd::Line(Point::new(1.0, 0.0)),
                PathCmd::Close,
                PathCmd::Move(Point::new(0.0, 0.0)),
                PathCmd::Line(Point::new(0.0, 1.0)),
            ]
        );
        assert_eq!(path.subpaths().len(), 2);
    }

    #[test]
    fn consecutive_moves_collapse() {
        let path = Path::builder()
            .move_to(Point::new(1.0, 1.0))
            .move_to(Point::new(2.0, 2.0))
            .line_to(Point::new(3.0, 3.0))
            .move_to(Point::new(9.0, 9.0))
            .build();
        assert_eq!(path.commands().len(), 2);
    }

    #[test]
    fn smooth_curves_reflect_controls() {
        let path = Path::builder()
            .move_to(Point::new(0.0, 0.0))
            .cubic_to(Point::new(0.0, 1.0), Point::new(1.0, 1.0), Point::new(1.0, 0.0))
            .cubic_smooth_to(Point::new(2.0, -1.0), Point::new(2.0, 0.0))
            .build();
        assert_eq!(
            path.commands()[2],
            PathCmd::Cubic(Point::new(1.0, -1.0), Point::new(2.0, -1.0), Point::new(2.0, 0.0))
        );
    }

    #[test]
    fn reverse_twice_is_identity() {
        let path = Path::builder()
            .move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(1.0, 0.0))
            .quad_to(Point::new(2.0, 1.0), Point::new(1.0, 2.0))
            .arc_to(Point::new(1.0, 1.0), 0.0, false, true, Point::new(0.0, 1.0))
            .build();
        let reversed = path.reverse();
        assert_eq!(reversed.commands()[0], PathCmd::Move(Point::new(0.0, 1.0)));
        assert_eq!(reversed.reverse(), path);
        let r1 = path.bounds();
        let r2 = reversed.bounds();
        assert_close!(r1.w, r2.w, 1e-9);
        assert_close!(r1.h, r2.h, 1e-9);
    }

    #[test]
    fn append_keeps_both() {
        let a = Path::rectangle(0.0, 0.0, 1.0, 1.0);
        let b = Path::circle(5.0, 5.0, 1.0);
        let joined = a.append(&b);
        assert_eq!(joined.subpaths().len(), 2);
        assert_eq!(joined.bounds(), a.bounds().union(b.bounds()));
    }

    #[test]
    fn length_of_square() {
        assert_close!(Path::rectangle(0.0, 0.0, 2.0, 3.0).length(0.01), 10.0, 1e-9);
    }
}
