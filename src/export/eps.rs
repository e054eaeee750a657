use std::fmt::Write as _;

use crate::canvas::Scene;
use crate::color::Color;
use crate::config::ExportOptions;
use crate::error::Result;
use crate::format::num;
use crate::stroke::{LineCap, LineJoin};

use super::{items, opaque_paint, write_postfix_path, Exporter, PathOperators};

const OPERATORS: PathOperators = PathOperators {
    move_to: "moveto",
    line_to: "lineto",
    curve_to: "curveto",
    close: "closepath",
};

/// Writes Encapsulated PostScript (EPSF-3.0) line art in RGB.
pub struct EpsExporter {
    options: ExportOptions,
}

impl EpsExporter {
    pub fn new(options: &ExportOptions) -> EpsExporter {
        EpsExporter { options: options.clone().sanitized() }
    }
}

impl Exporter for EpsExporter {
    type Output = String;

    fn export(&self, scene: &Scene) -> Result<String> {
        let precision = self.options.precision;
        let n = |v: f64| num(v, precision);
        let rgb = |c: Color| format!("{} {} {} setrgbcolor", n(c.r as f64), n(c.g as f64), n(c.b as f64));
        let ppu = self.options.points_per_unit;
        let (width, height) = (scene.width() * ppu, scene.height() * ppu);

        let mut out = String::new();
        out.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
        let _ = writeln!(out, "%%Creator: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let _ = writeln!(out, "%%BoundingBox: 0 0 {} {}", width.ceil() as i64, height.ceil() as i64);
        let _ = writeln!(out, "%%HiResBoundingBox: 0 0 {} {}", n(width), n(height));
        out.push_str("%%LanguageLevel: 2\n%%EndComments\n");
        out.push_str("gsave\n");
        let _ = writeln!(out, "{} {} scale", n(ppu), n(ppu));

        for item in items(scene) {
            let fill = match item.fill {
                Some(color) => opaque_paint(color, &self.options, "EPS")?,
                None => None,
            };
            let stroke = match item.stroke {
                Some(stroke) => opaque_paint(stroke.color, &self.options, "EPS")?.map(|c| (c, stroke)),
                None => None,
            };
            if fill.is_none() && stroke.is_none() {
                continue;
            }

            out.push_str("newpath\n");
            write_postfix_path(&item.path, &OPERATORS, precision, &mut out);
            if let Some(color) = fill {
                if stroke.is_some() {
                    let _ = writeln!(out, "gsave {} fill grestore", rgb(color));
                } else {
                    let _ = writeln!(out, "{} fill", rgb(color));
                }
            }
            if let Some((color, stroke)) = stroke {
                let style = &stroke.style;
                let cap = match style.cap {
                    LineCap::Butt => 0,
                    LineCap::Round => 1,
                    LineCap::Square => 2,
                };
                let join = match style.join {
                    LineJoin::Miter => 0,
                    LineJoin::Round => 1,
                    LineJoin::Bevel => 2,
                };
                let _ = writeln!(out, "gsave {}", rgb(color));
                let _ = writeln!(
                    out,
                    "{} setlinewidth {} setlinecap {} setlinejoin {} setmiterlimit",
                    n(style.width),
                    cap,
                    join,
                    n(style.miter_limit.max(1.0))
                );
                if let Some(pattern) = style.dash_pattern() {
                    let dashes: Vec<String> = pattern.iter().map(|d| n(*d)).collect();
                    let _ = writeln!(out, "[{}] {} setdash", dashes.join(" "), n(style.dash_offset));
                }
                out.push_str("stroke grestore\n");
            }
        }

        out.push_str("grestore\nshowpage\n%%EOF\n");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::AlphaMode;
    use crate::error::Error;
    use crate::path::Path;
    use crate::stroke::StrokeStyle;

    #[test]
    fn header_and_bounding_box() {
        let canvas = Canvas::open(180.0, 70.0).unwrap();
        let eps = EpsExporter::new(&ExportOptions::default()).export(canvas.scene()).unwrap();
        assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"));
        assert!(eps.contains("%%BoundingBox: 0 0 511 199\n"));
        assert!(eps.ends_with("showpage\n%%EOF\n"));
    }

    #[test]
    fn paths_use_postscript_operators() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        canvas
            .set_color(Color::GREEN)
            .set_stroke(Color::BLACK, StrokeStyle::new(0.25).join(LineJoin::Round))
            .draw_path(1.0, 1.0, &Path::parse("M0 0L2 0Q3 1 2 2z").unwrap());
        let eps = EpsExporter::new(&ExportOptions::default()).export(canvas.scene()).unwrap();
        assert!(eps.contains("newpath\n1 1 moveto\n3 1 lineto\n"));
        assert!(eps.contains(" 3 3 curveto\nclosepath\n"));
        assert!(eps.contains("gsave 0 1 0 setrgbcolor fill grestore\n"));
        assert!(eps.contains("0.25 setlinewidth 0 setlinecap 1 setlinejoin 4 setmiterlimit\n"));
        assert!(eps.contains("stroke grestore\n"));
    }

    #[test]
    fn no_alpha_channel() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        canvas.set_color(Color::rgba(1.0, 0.0, 0.0, 0.25));
        canvas.draw_path(0.0, 0.0, &Path::rectangle(0.0, 0.0, 1.0, 1.0));
        let options = ExportOptions { alpha: AlphaMode::Reject, ..ExportOptions::default() };
        assert!(matches!(
            EpsExporter::new(&options).export(canvas.scene()),
            Err(Error::UnsupportedFeature(_))
        ));
        let eps = EpsExporter::new(&ExportOptions::default()).export(canvas.scene()).unwrap();
        assert!(eps.contains("1 0.75 0.75 setrgbcolor fill"));
    }
}
