//! Serialisation of a [`Scene`] into concrete artifacts.
//!
//! Every exporter reads the scene without modifying it and maps scene
//! coordinates (millimetres, y up, origin bottom-left) onto its target
//! format once, at output time.

mod eps;
mod pdf;
mod raster;
mod svg;

pub use eps::EpsExporter;
pub use pdf::PdfExporter;
pub use raster::{encode_png, RasterExporter};
pub use svg::SvgExporter;

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::arc::CenterArc;
use crate::canvas::{Op, Scene, Stroke};
use crate::color::Color;
use crate::config::{AlphaMode, ExportOptions};
use crate::error::{Error, Result};
use crate::format::num;
use crate::geom::Point;
use crate::path::{Path, PathCmd};

/// A backend turning a scene into one artifact.
pub trait Exporter {
    type Output;

    fn export(&self, scene: &Scene) -> Result<Self::Output>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Svg,
    Pdf,
    Png,
    Eps,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Svg => "svg",
            Format::Pdf => "pdf",
            Format::Png => "png",
            Format::Eps => "eps",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(Format::Svg),
            "pdf" => Some(Format::Pdf),
            "png" => Some(Format::Png),
            "eps" | "ps" => Some(Format::Eps),
            _ => None,
        }
    }
}

/// Encodes `scene` in `format`.
pub fn export(format: Format, scene: &Scene, options: &ExportOptions) -> Result<Vec<u8>> {
    log::debug!("exporting {} operations as {:?}", scene.ops().len(), format);
    let bytes = match format {
        Format::Svg => SvgExporter::new(options).export(scene)?.into_bytes(),
        Format::Pdf => PdfExporter::new(options).export(scene)?,
        Format::Eps => EpsExporter::new(options).export(scene)?.into_bytes(),
        Format::Png => encode_png(&RasterExporter::new(options).export(scene)?)?,
    };
    log::debug!("{:?} artifact is {} bytes", format, bytes.len());
    Ok(bytes)
}

/// Encodes `scene` completely in memory, then commits it to `sink` with a
/// single write. Nothing is written when encoding fails.
pub fn write_to<W: Write>(format: Format, scene: &Scene, options: &ExportOptions, sink: &mut W) -> Result<()> {
    let bytes = export(format, scene, options)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    Ok(())
}

/// The colour an opaque-only format should paint with, or `None` when the
/// paint is invisible.
pub(crate) fn opaque_paint(color: Color, options: &ExportOptions, format: &str) -> Result<Option<Color>> {
    if color.a <= 0.0 {
        return Ok(None);
    }
    if color.is_opaque() {
        return Ok(Some(color));
    }
    match options.alpha {
        AlphaMode::Reject => Err(Error::UnsupportedFeature(format!(
            "translucent colour {} cannot be represented in {}",
            color, format
        ))),
        AlphaMode::Blend => {
            let blended = color.over_white();
            log::warn!("{}: approximating translucent colour {} with {}", format, color, blended);
            Ok(Some(blended))
        }
    }
}

/// One paint job in scene coordinates, in paint order.
pub(crate) struct Item<'a> {
    pub path: Path,
    pub fill: Option<Color>,
    pub stroke: Option<&'a Stroke>,
    /// The string drawn, for text operations.
    pub text: Option<&'a str>,
}

/// Flattens the operation log into placed paths. Operations that paint
/// nothing are dropped.
pub(crate) fn items(scene: &Scene) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    for op in scene.ops() {
        let item = match op {
            Op::Path(op) => Item {
                path: op.placed_path(),
                fill: op.fill,
                stroke: op.stroke.as_ref(),
                text: None,
            },
            Op::Text(op) => Item {
                path: op.placed_path(),
                fill: Some(op.color),
                stroke: None,
                text: Some(&op.text),
            },
        };
        if item.path.is_empty() || (item.fill.is_none() && item.stroke.is_none()) {
            continue;
        }
        items.push(item);
    }
    items
}

/// Operator names of a postfix path language.
pub(crate) struct PathOperators {
    pub move_to: &'static str,
    pub line_to: &'static str,
    pub curve_to: &'static str,
    pub close: &'static str,
}

/// Writes `path` with cubic curves only: quadratics are elevated and arcs
/// split into cubics of at most 90°.
pub(crate) fn write_postfix_path(path: &Path, ops: &PathOperators, precision: usize, out: &mut String) {
    let n = |v: f64| num(v, precision);
    let pt = |p: Point| format!("{} {}", n(p.x), n(p.y));
    let mut start = Point::new(0.0, 0.0);
    let mut current = start;
    for command in path.commands() {
        match *command {
            PathCmd::Move(p) => {
                out.push_str(&format!("{} {}\n", pt(p), ops.move_to));
                start = p;
            }
            PathCmd::Line(p) => out.push_str(&format!("{} {}\n", pt(p), ops.line_to)),
            PathCmd::Quadratic(c, p) => {
                let c1 = current + (2.0 / 3.0) * (c - current);
                let c2 = p + (2.0 / 3.0) * (c - p);
                out.push_str(&format!("{} {} {} {}\n", pt(c1), pt(c2), pt(p), ops.curve_to));
            }
            PathCmd::Cubic(c1, c2, p) => {
                out.push_str(&format!("{} {} {} {}\n", pt(c1), pt(c2), pt(p), ops.curve_to));
            }
            PathCmd::Arc { radii, rotation, large_arc, sweep, to } => {
                match CenterArc::from_endpoints(current, to, radii, rotation, large_arc, sweep) {
                    Some(arc) => {
                        for (c1, c2, p) in arc.to_cubics() {
                            out.push_str(&format!("{} {} {} {}\n", pt(c1), pt(c2), pt(p), ops.curve_to));
                        }
                    }
                    None => out.push_str(&format!("{} {}\n", pt(to), ops.line_to)),
                }
            }
            PathCmd::Close => {
                out.push_str(ops.close);
                out.push('\n');
                current = start;
                continue;
            }
        }
        current = command.end().unwrap_or(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::stroke::StrokeStyle;

    fn scene() -> Scene {
        let mut canvas = Canvas::open(100.0, 50.0).unwrap();
        canvas.set_stroke(Color::BLUE, StrokeStyle::new(1.0));
        canvas.draw_path(10.0, 10.0, &Path::circle(0.0, 0.0, 5.0));
        canvas.finish()
    }

    #[test]
    fn formats_end_with_terminal_markers() {
        let options = ExportOptions::default();
        let scene = scene();
        let svg = export(Format::Svg, &scene, &options).unwrap();
        assert!(svg.ends_with(b"</svg>\n"));
        let pdf = export(Format::Pdf, &scene, &options).unwrap();
        assert!(pdf.ends_with(b"%%EOF\n"));
        let eps = export(Format::Eps, &scene, &options).unwrap();
        assert!(eps.ends_with(b"%%EOF\n"));
        let png = export(Format::Png, &scene, &options).unwrap();
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn output_is_deterministic() {
        let options = ExportOptions::default();
        let scene = scene();
        for format in [Format::Svg, Format::Pdf, Format::Png, Format::Eps] {
            assert_eq!(export(format, &scene, &options).unwrap(), export(format, &scene, &options).unwrap());
        }
    }

    #[test]
    fn write_to_commits_whole_artifact() {
        let mut sink = Vec::new();
        write_to(Format::Svg, &scene(), &ExportOptions::default(), &mut sink).unwrap();
        assert_eq!(sink, export(Format::Svg, &scene(), &ExportOptions::default()).unwrap());
    }

    #[test]
    fn failed_export_writes_nothing() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        canvas.set_color(Color::rgba(1.0, 0.0, 0.0, 0.5));
        canvas.draw_path(0.0, 0.0, &Path::rectangle(0.0, 0.0, 1.0, 1.0));
        let options = ExportOptions { alpha: AlphaMode::Reject, ..ExportOptions::default() };
        let mut sink = Vec::new();
        let err = write_to(Format::Pdf, canvas.scene(), &options, &mut sink).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
        assert!(sink.is_empty());
        assert!(write_to(Format::Svg, canvas.scene(), &options, &mut sink).is_ok());
    }

    #[test]
    fn extensions() {
        assert_eq!(Format::from_extension("PDF"), Some(Format::Pdf));
        assert_eq!(Format::from_extension(Format::Eps.extension()), Some(Format::Eps));
        assert_eq!(Format::from_extension("gif"), None);
    }

    #[test]
    fn postfix_path_uses_cubics_only() {
        let mut out = String::new();
        let ops = PathOperators { move_to: "m", line_to: "l", curve_to: "c", close: "h" };
        write_postfix_path(&Path::parse("M0 0Q1 1 2 0A1 1 0 0 1 4 0z").unwrap(), &ops, 5, &mut out);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "0 0 m");
        assert!(lines[1].ends_with(" 2 0 c"));
        assert!(lines[2..lines.len() - 1].iter().all(|l| l.ends_with(" c")));
        assert_eq!(lines.last(), Some(&"h"));
    }
}
