use crate::flatten::Polyline;
use crate::geom::{Point, Rect};

/// The tile size used by the rasterizer (not configurable).
pub const TILE_SIZE: usize = 8;

/// A trait to implement for consuming the coverage produced by
/// [`Rasterizer::finish`].
pub trait TileBuilder {
    /// Called with the position and coverage of an 8×8 alpha mask tile.
    fn tile(&mut self, x: i32, y: i32, data: [u8; TILE_SIZE * TILE_SIZE]);

    /// Called with the position and width of a fully covered interior span.
    ///
    /// The height of a span is always [`TILE_SIZE`] pixels.
    fn span(&mut self, x: i32, y: i32, width: u32);
}

#[derive(Copy, Clone)]
struct Increment {
    x: i32,
    y: i32,
    area: f64,
    height: f64,
}

#[derive(Copy, Clone)]
struct TileIncrement {
    tile_x: i32,
    tile_y: i32,
    sign: i8,
}

/// Scan-converts polygons in pixel space (y down) with the nonzero fill
/// rule, using exact area coverage for antialiasing.
pub struct Rasterizer {
    increments: Vec<Increment>,
    tile_increments: Vec<TileIncrement>,
    first: Point,
    last: Point,
    tile_y_prev: i32,
    bounds: Option<Rect>,
}

impl Default for Rasterizer {
    fn default() -> Rasterizer {
        Rasterizer::new()
    }
}

impl Rasterizer {
    pub fn new() -> Rasterizer {
        Rasterizer {
            increments: Vec::new(),
            tile_increments: Vec::new(),
            first: Point::new(0.0, 0.0),
            last: Point::new(0.0, 0.0),
            tile_y_prev: 0,
            bounds: None,
        }
    }

    /// A rasterizer whose output only matters inside `width × height`
    /// pixels. Contours passed to [`Rasterizer::fill`] are clamped to that
    /// area plus a one-tile margin, so the work done no longer depends on
    /// how far geometry extends outside it.
    pub fn with_bounds(width: u32, height: u32) -> Rasterizer {
        let margin = TILE_SIZE as f64;
        Rasterizer {
            bounds: Some(Rect::new(-margin, -margin, width as f64 + 2.0 * margin, height as f64 + 2.0 * margin)),
            ..Rasterizer::new()
        }
    }

    /// Begins a new contour, closing the previous one.
    pub fn move_to(&mut self, point: Point) {
        if !is_finite(point) {
            return;
        }
        if self.last != self.first {
            self.line_to(self.first);
        }

        self.first = point;
        self.last = point;
        self.tile_y_prev = (point.y.floor() as i32).div_euclid(TILE_SIZE as i32);
    }

    pub fn line_to(&mut self, point: Point) {
        if !is_finite(point) {
            return;
        }
        if point != self.last {
            let x_dir = (point.x - self.last.x).signum() as i32;
            let y_dir = (point.y - self.last.y).signum() as i32;
            let dtdx = 1.0 / (point.x - self.last.x);
            let dtdy = 1.0 / (point.y - self.last.y);
            let mut x = self.last.x.floor() as i32;
            let mut y = self.last.y.floor() as i32;
            let mut row_t0: f64 = 0.0;
            let mut col_t0: f64 = 0.0;
            let mut row_t1 = if self.last.y == point.y {
                f64::INFINITY
            } else {
                let next_y = if point.y > self.last.y { (y + 1) as f64 } else { y as f64 };
                (dtdy * (next_y - self.last.y)).min(1.0)
            };
            let mut col_t1 = if self.last.x == point.x {
                f64::INFINITY
            } else {
                let next_x = if point.x > self.last.x { (x + 1) as f64 } else { x as f64 };
                (dtdx * (next_x - self.last.x)).min(1.0)
            };
            let x_step = dtdx.abs();
            let y_step = dtdy.abs();

            loop {
                let t0 = row_t0.max(col_t0);
                let t1 = row_t1.min(col_t1);
                let p0 = Point::lerp(t0, self.last, point);
                let p1 = Point::lerp(t1, self.last, point);
                let height = p1.y - p0.y;
                let right = (x + 1) as f64;
                let area = 0.5 * height * ((right - p0.x) + (right - p1.x));

                self.increments.push(Increment { x, y, area, height });

                if row_t1 < col_t1 {
                    row_t0 = row_t1;
                    row_t1 = (row_t1 + y_step).min(1.0);
                    y += y_dir;
                } else {
                    col_t0 = col_t1;
                    col_t1 = (col_t1 + x_step).min(1.0);
                    x += x_dir;
                }

                if row_t0 == 1.0 || col_t0 == 1.0 {
                    x = point.x.floor() as i32;
                    y = point.y.floor() as i32;
                }

                let tile_y = y.div_euclid(TILE_SIZE as i32);
                if tile_y != self.tile_y_prev {
                    self.tile_increments.push(TileIncrement {
                        tile_x: x.div_euclid(TILE_SIZE as i32),
                        tile_y: self.tile_y_prev.min(tile_y),
                        sign: (tile_y - self.tile_y_prev).signum() as i8,
                    });
                    self.tile_y_prev = tile_y;
                }

                if row_t0 == 1.0 || col_t0 == 1.0 {
                    break;
                }
            }
        }

        self.last = point;
    }

    /// Adds polygons to be filled. Open polylines are closed implicitly.
    /// Polylines with non-finite coordinates are skipped.
    pub fn fill(&mut self, polylines: &[Polyline]) {
        let mut clipped = Vec::new();
        for polyline in polylines {
            if !polyline.points.iter().all(|&p| is_finite(p)) {
                log::trace!("skipping contour with non-finite coordinates");
                continue;
            }
            let points = match self.bounds {
                Some(bounds) => {
                    clipped.clear();
                    clamp_contour(&polyline.points, bounds, &mut clipped);
                    &clipped[..]
                }
                None => &polyline.points[..],
            };
            let mut points = points.iter();
            if let Some(&first) = points.next() {
                self.move_to(first);
                for &p in points {
                    self.line_to(p);
                }
            }
        }
    }

    /// Rasterizes the accumulated contours, passing the results to the
    /// given [`TileBuilder`]. Consumes the rasterizer.
    ///
    /// Edges produce 8×8 alpha mask tiles; runs of tiles between edges
    /// whose winding is nonzero produce solid spans.
    pub fn finish<B: TileBuilder>(mut self, builder: &mut B) {
        if self.last != self.first {
            self.line_to(self.first);
        }
        if self.increments.is_empty() {
            return;
        }

        #[derive(Copy, Clone)]
        struct Bin {
            tile_x: i32,
            tile_y: i32,
            start: usize,
            end: usize,
        }

        let tile = TILE_SIZE as i32;
        let mut bins = Vec::new();
        let mut bin = Bin {
            tile_x: self.increments[0].x.div_euclid(tile),
            tile_y: self.increments[0].y.div_euclid(tile),
            start: 0,
            end: 0,
        };
        for (i, increment) in self.increments.iter().enumerate() {
            let tile_x = increment.x.div_euclid(tile);
            let tile_y = increment.y.div_euclid(tile);
            if tile_x != bin.tile_x || tile_y != bin.tile_y {
                bins.push(bin);
                bin = Bin { tile_x, tile_y, start: i, end: i };
            }
            bin.end += 1;
        }
        bins.push(bin);
        bins.sort_by_key(|bin| (bin.tile_y, bin.tile_x, bin.start));

        self.tile_increments.sort_by_key(|tile_inc| (tile_inc.tile_y, tile_inc.tile_x));

        let mut areas = [0.0; TILE_SIZE * TILE_SIZE];
        let mut heights = [0.0; TILE_SIZE * TILE_SIZE];
        let mut prev = [0.0; TILE_SIZE];
        let mut next = [0.0; TILE_SIZE];

        let mut tile_increments_i = 0;
        let mut winding: isize = 0;

        for i in 0..bins.len() {
            let bin = bins[i];
            for increment in &self.increments[bin.start..bin.end] {
                let x = increment.x.rem_euclid(tile) as usize;
                let y = increment.y.rem_euclid(tile) as usize;
                areas[y * TILE_SIZE + x] += increment.area;
                heights[y * TILE_SIZE + x] += increment.height;
            }

            let last_in_tile = i + 1 == bins.len() || bins[i + 1].tile_x != bin.tile_x || bins[i + 1].tile_y != bin.tile_y;
            if !last_in_tile {
                continue;
            }

            let mut data = [0; TILE_SIZE * TILE_SIZE];
            for y in 0..TILE_SIZE {
                let mut accum = prev[y];
                for x in 0..TILE_SIZE {
                    data[y * TILE_SIZE + x] = ((accum + areas[y * TILE_SIZE + x]).abs() * 256.0).min(255.0) as u8;
                    accum += heights[y * TILE_SIZE + x];
                }
                next[y] = accum;
            }

            builder.tile(bin.tile_x * tile, bin.tile_y * tile, data);

            let same_row = i + 1 < bins.len() && bins[i + 1].tile_y == bin.tile_y;
            areas = [0.0; TILE_SIZE * TILE_SIZE];
            heights = [0.0; TILE_SIZE * TILE_SIZE];
            prev = if same_row { next } else { [0.0; TILE_SIZE] };
            next = [0.0; TILE_SIZE];

            if same_row && bins[i + 1].tile_x > bin.tile_x + 1 {
                while tile_increments_i < self.tile_increments.len() {
                    let tile_increment = self.tile_increments[tile_increments_i];
                    if (tile_increment.tile_y, tile_increment.tile_x) > (bin.tile_y, bin.tile_x) {
                        break;
                    }
                    winding += tile_increment.sign as isize;
                    tile_increments_i += 1;
                }
                if winding != 0 {
                    let width = (bins[i + 1].tile_x - bin.tile_x - 1) as u32;
                    builder.span((bin.tile_x + 1) * tile, bin.tile_y * tile, width * TILE_SIZE as u32);
                }
            }
        }
    }
}

fn is_finite(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Replaces the closed contour `points` with its pointwise clamp onto
/// `bounds`. Edges are split where they cross the bounds, so each piece
/// clamps to a straight segment. Winding numbers inside `bounds` are
/// unchanged; outside parts collapse onto the border.
fn clamp_contour(points: &[Point], bounds: Rect, out: &mut Vec<Point>) {
    let (min, max) = (bounds.min(), bounds.max());
    let clamp = |p: Point| Point::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y));
    let push = |p: Point, out: &mut Vec<Point>| {
        let p = clamp(p);
        if out.last().map_or(true, |&last| last.x != p.x || last.y != p.y) {
            out.push(p);
        }
    };

    let n = points.len();
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        push(a, out);
        let mut crossings = [0.0; 4];
        let mut count = 0;
        for (from, to, edge) in [(a.x, b.x, min.x), (a.x, b.x, max.x), (a.y, b.y, min.y), (a.y, b.y, max.y)] {
            if (from - edge) * (to - edge) < 0.0 {
                crossings[count] = ((edge - from) / (to - from)).clamp(0.0, 1.0);
                count += 1;
            }
        }
        let crossings = &mut crossings[..count];
        crossings.sort_by(f64::total_cmp);
        for &t in crossings.iter() {
            push(Point::lerp(t, a, b), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects coverage into a dense `width × height` buffer.
    struct Coverage {
        width: usize,
        height: usize,
        data: Vec<u8>,
    }

    impl Coverage {
        fn new(width: usize, height: usize) -> Coverage {
            Coverage { width, height, data: vec![0; width * height] }
        }

        fn set(&mut self, x: i32, y: i32, value: u8) {
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.data[y as usize * self.width + x as usize] = value;
            }
        }

        fn at(&self, x: usize, y: usize) -> u8 {
            self.data[y * self.width + x]
        }
    }

    impl TileBuilder for Coverage {
        fn tile(&mut self, x: i32, y: i32, data: [u8; TILE_SIZE * TILE_SIZE]) {
            for row in 0..TILE_SIZE {
                for col in 0..TILE_SIZE {
                    self.set(x + col as i32, y + row as i32, data[row * TILE_SIZE + col]);
                }
            }
        }

        fn span(&mut self, x: i32, y: i32, width: u32) {
            for row in 0..TILE_SIZE as i32 {
                for col in 0..width as i32 {
                    self.set(x + col, y + row, 255);
                }
            }
        }
    }

    fn square(x: f64, y: f64, size: f64, clockwise: bool) -> Polyline {
        let mut points = vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ];
        if clockwise {
            points.reverse();
        }
        Polyline { points, closed: true }
    }

    fn render(polylines: &[Polyline], size: usize) -> Coverage {
        let mut rasterizer = Rasterizer::new();
        rasterizer.fill(polylines);
        let mut coverage = Coverage::new(size, size);
        rasterizer.finish(&mut coverage);
        coverage
    }

    #[test]
    fn pixel_aligned_square() {
        let coverage = render(&[square(2.0, 3.0, 30.0, false)], 40);
        for y in 0..40 {
            for x in 0..40 {
                let inside = (2..32).contains(&x) && (3..33).contains(&y);
                assert_eq!(coverage.at(x, y), if inside { 255 } else { 0 }, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn half_covered_pixels() {
        let coverage = render(&[square(0.5, 0.0, 4.0, true)], 8);
        assert!((coverage.at(0, 1) as i32 - 128).abs() <= 1);
        assert_eq!(coverage.at(2, 1), 255);
        assert!((coverage.at(4, 1) as i32 - 128).abs() <= 1);
        assert_eq!(coverage.at(5, 1), 0);
    }

    #[test]
    fn opposite_contours_cut_a_hole() {
        let coverage = render(&[square(0.0, 0.0, 32.0, false), square(8.0, 8.0, 16.0, true)], 32);
        assert_eq!(coverage.at(4, 4), 255);
        assert_eq!(coverage.at(16, 16), 0);
        assert_eq!(coverage.at(28, 16), 255);
    }

    #[test]
    fn same_direction_contours_stay_filled() {
        let coverage = render(&[square(0.0, 0.0, 32.0, false), square(8.0, 8.0, 16.0, false)], 32);
        assert_eq!(coverage.at(16, 16), 255);
    }

    #[test]
    fn negative_coordinates_are_handled() {
        let coverage = render(&[square(-10.0, -10.0, 15.0, false)], 8);
        assert_eq!(coverage.at(0, 0), 255);
        assert_eq!(coverage.at(4, 4), 255);
        assert_eq!(coverage.at(5, 5), 0);
    }

    fn render_bounded(polylines: &[Polyline], size: usize) -> (Coverage, usize) {
        let mut rasterizer = Rasterizer::with_bounds(size as u32, size as u32);
        rasterizer.fill(polylines);
        let increments = rasterizer.increments.len();
        let mut coverage = Coverage::new(size, size);
        rasterizer.finish(&mut coverage);
        (coverage, increments)
    }

    #[test]
    fn clamping_keeps_coverage_inside_bounds() {
        let triangle = Polyline {
            points: vec![Point::new(-30.0, 4.5), Point::new(40.0, -20.0), Point::new(13.3, 50.0)],
            closed: true,
        };
        let shapes = [triangle, square(-20.0, 6.0, 45.0, true), square(3.0, 3.0, 5.0, false)];
        let full = render(&shapes, 16);
        let (clamped, _) = render_bounded(&shapes, 16);
        for y in 0..16 {
            for x in 0..16 {
                let (a, b) = (full.at(x, y) as i32, clamped.at(x, y) as i32);
                assert!((a - b).abs() <= 1, "pixel ({}, {}): {} vs {}", x, y, a, b);
            }
        }
    }

    #[test]
    fn distant_geometry_costs_nothing_extra() {
        let wide = Polyline {
            points: vec![
                Point::new(1.0, 4.0),
                Point::new(3e7, 4.0),
                Point::new(3e7, 6.0),
                Point::new(1.0, 6.0),
            ],
            closed: true,
        };
        let (coverage, increments) = render_bounded(&[wide], 10);
        assert!(increments < 1000, "{} increments", increments);
        assert_eq!(coverage.at(0, 5), 0);
        assert_eq!(coverage.at(1, 4), 255);
        assert_eq!(coverage.at(9, 5), 255);
        assert_eq!(coverage.at(5, 6), 0);
    }

    #[test]
    fn non_finite_contours_are_skipped() {
        let broken = Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(f64::INFINITY, 0.0), Point::new(0.0, 5.0)],
            closed: true,
        };
        let nan = Polyline { points: vec![Point::new(f64::NAN, 1.0), Point::new(2.0, 2.0)], closed: false };
        let coverage = render(&[broken, nan, square(0.0, 0.0, 2.0, false)], 8);
        assert_eq!(coverage.at(1, 1), 255);
        assert_eq!(coverage.at(3, 1), 0);

        let mut rasterizer = Rasterizer::new();
        rasterizer.move_to(Point::new(0.0, 0.0));
        rasterizer.line_to(Point::new(f64::INFINITY, 3.0));
        rasterizer.line_to(Point::new(f64::NAN, f64::NAN));
        assert!(rasterizer.increments.is_empty());
    }
}
