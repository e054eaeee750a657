use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::canvas::Scene;
use crate::color::Color;
use crate::config::ExportOptions;
use crate::error::{Error, Result};
use crate::flatten::Polyline;
use crate::geom::*;
use crate::rasterizer::{Rasterizer, TileBuilder, TILE_SIZE};
use crate::stroke::Stroker;

use super::{items, Exporter};

/// Largest accepted image side, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Renders a scene into an RGBA image at `raster.scale` pixels per scene
/// unit, antialiased, composited source-over in paint order.
pub struct RasterExporter {
    options: ExportOptions,
}

impl RasterExporter {
    pub fn new(options: &ExportOptions) -> RasterExporter {
        RasterExporter { options: options.clone().sanitized() }
    }

    fn size(&self, scene: &Scene) -> Result<(u32, u32)> {
        let scale = self.options.raster.scale;
        let width = (scene.width() * scale).ceil();
        let height = (scene.height() * scale).ceil();
        let limit = MAX_DIMENSION as f64;
        if !(width >= 1.0 && height >= 1.0 && width <= limit && height <= limit) {
            return Err(Error::UnsupportedFeature(format!(
                "raster size {}x{} outside 1..={} pixels",
                width, height, MAX_DIMENSION
            )));
        }
        Ok((width as u32, height as u32))
    }
}

impl Exporter for RasterExporter {
    type Output = RgbaImage;

    fn export(&self, scene: &Scene) -> Result<RgbaImage> {
        let (width, height) = self.size(scene)?;
        let scale = self.options.raster.scale;
        log::debug!("rasterizing {}x{} pixels at scale {}", width, height, scale);

        let background = self.options.raster.background.unwrap_or(Color::TRANSPARENT);
        let mut image = RgbaImage::from_pixel(width, height, Rgba(background.to_rgba8()));

        // y down, origin top-left
        let to_pixels = Transform::new(Mat2x2::scale(scale, -scale), Point::new(0.0, scene.height() * scale));

        let tolerance = self.options.tolerance;
        for item in items(scene) {
            if let Some(color) = item.fill {
                let polylines = item.path.transform(&to_pixels).flatten(tolerance * scale);
                paint(&mut image, &polylines, color);
            }
            if let Some(stroke) = item.stroke {
                let mut stroker = Stroker::new(&stroke.style);
                stroker.tolerance(tolerance);
                let mut outlines = stroker.stroke_polylines(&item.path.flatten(tolerance));
                for outline in &mut outlines {
                    for point in &mut outline.points {
                        *point = to_pixels.apply(*point);
                    }
                }
                paint(&mut image, &outlines, stroke.color);
            }
        }

        Ok(image)
    }
}

fn paint(image: &mut RgbaImage, polylines: &[Polyline], color: Color) {
    if polylines.is_empty() || color.a <= 0.0 {
        return;
    }
    let mut rasterizer = Rasterizer::with_bounds(image.width(), image.height());
    rasterizer.fill(polylines);
    let mut compositor = Compositor { image, color: color.to_rgba8() };
    rasterizer.finish(&mut compositor);
}

/// Blends one colour into the image through the coverage it is handed,
/// clipping to the image bounds.
struct Compositor<'a> {
    image: &'a mut RgbaImage,
    color: [u8; 4],
}

impl Compositor<'_> {
    fn blend(&mut self, x: i32, y: i32, coverage: u8) {
        if coverage == 0 || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }

        let [r, g, b, a] = self.color;
        let src_a = a as f32 / 255.0 * coverage as f32 / 255.0;
        let dst = self.image.get_pixel_mut(x, y);
        let dst_a = dst.0[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let channel = |s: u8, d: u8| {
            let value = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };
        dst.0 = [
            channel(r, dst.0[0]),
            channel(g, dst.0[1]),
            channel(b, dst.0[2]),
            (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        ];
    }
}

impl TileBuilder for Compositor<'_> {
    fn tile(&mut self, x: i32, y: i32, data: [u8; TILE_SIZE * TILE_SIZE]) {
        for row in 0..TILE_SIZE {
            for col in 0..TILE_SIZE {
                self.blend(x + col as i32, y + row as i32, data[row * TILE_SIZE + col]);
            }
        }
    }

    fn span(&mut self, x: i32, y: i32, width: u32) {
        for row in 0..TILE_SIZE as i32 {
            for col in 0..width as i32 {
                self.blend(x + col, y + row, 255);
            }
        }
    }
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
