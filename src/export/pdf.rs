use std::fmt::Write as _;

use crate::canvas::Scene;
use crate::color::Color;
use crate::config::ExportOptions;
use crate::error::Result;
use crate::format::num;
use crate::geom::Transform;
use crate::stroke::{LineCap, LineJoin};

use super::{items, opaque_paint, write_postfix_path, Exporter, PathOperators};

const OPERATORS: PathOperators = PathOperators {
    move_to: "m",
    line_to: "l",
    curve_to: "c",
    close: "h",
};

/// Writes a single-page PDF 1.4 document. The page is the canvas scaled by
/// `points_per_unit`; drawing happens in scene units through the page's
/// current transformation matrix.
pub struct PdfExporter {
    options: ExportOptions,
}

impl PdfExporter {
    pub fn new(options: &ExportOptions) -> PdfExporter {
        PdfExporter { options: options.clone().sanitized() }
    }

    fn content(&self, scene: &Scene) -> Result<String> {
        let precision = self.options.precision;
        let n = |v: f64| num(v, precision);
        let rgb = |c: Color| format!("{} {} {}", n(c.r as f64), n(c.g as f64), n(c.b as f64));

        let mut out = String::new();
        let ppu = self.options.points_per_unit;
        let page: Vec<String> = Transform::scale(ppu, ppu).coefficients().iter().map(|v| n(*v)).collect();
        let _ = writeln!(out, "{} cm", page.join(" "));

        for item in items(scene) {
            let fill = match item.fill {
                Some(color) => opaque_paint(color, &self.options, "PDF")?,
                None => None,
            };
            let stroke = match item.stroke {
                Some(stroke) => opaque_paint(stroke.color, &self.options, "PDF")?.map(|c| (c, stroke)),
                None => None,
            };
            if fill.is_none() && stroke.is_none() {
                continue;
            }

            out.push_str("q\n");
            if let Some(color) = fill {
                let _ = writeln!(out, "{} rg", rgb(color));
            }
            if let Some((color, stroke)) = stroke {
                let style = &stroke.style;
                let _ = writeln!(out, "{} RG", rgb(color));
                let _ = writeln!(out, "{} w", n(style.width));
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
                let _ = writeln!(out, "{} J {} j {} M", cap, join, n(style.miter_limit.max(1.0)));
                if let Some(pattern) = style.dash_pattern() {
                    let dashes: Vec<String> = pattern.iter().map(|d| n(*d)).collect();
                    let _ = writeln!(out, "[{}] {} d", dashes.join(" "), n(style.dash_offset));
                }
            }
            write_postfix_path(&item.path, &OPERATORS, precision, &mut out);
            out.push_str(match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B\n",
                (true, false) => "f\n",
                _ => "S\n",
            });
            out.push_str("Q\n");
        }
        Ok(out)
    }
}

impl Exporter for PdfExporter {
    type Output = Vec<u8>;

    fn export(&self, scene: &Scene) -> Result<Vec<u8>> {
        let precision = self.options.precision;
        let ppu = self.options.points_per_unit;
        let content = self.content(scene)?;

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << >> /Contents 4 0 R >>",
                num(scene.width() * ppu, precision),
                num(scene.height() * ppu, precision)
            ),
            format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            offsets.push(out.len());
            let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, object);
        }

        let xref = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = write!(out, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        );
        Ok(out.into_bytes())
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

    fn export(canvas: &Canvas, options: &ExportOptions) -> Result<String> {
        let bytes = PdfExporter::new(options).export(canvas.scene())?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut canvas = Canvas::open(180.0, 70.0).unwrap();
        canvas.draw_path(0.0, 0.0, &Path::rectangle(0.0, 0.0, 50.0, 30.0));
        let pdf = export(&canvas, &ExportOptions::default()).unwrap();
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));

        let xref_at: usize = pdf.lines().rev().nth(1).unwrap().parse().unwrap();
        assert!(pdf[xref_at..].starts_with("xref\n0 5\n"));
        let entries: Vec<&str> = pdf[xref_at..].lines().skip(3).take(4).collect();
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.len(), 19);
            let offset: usize = entry[..10].parse().unwrap();
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn page_is_sized_in_points() {
        let canvas = Canvas::open(25.4, 50.8).unwrap();
        let pdf = export(&canvas, &ExportOptions::default()).unwrap();
        assert!(pdf.contains("/MediaBox [0 0 72 144]"));
        assert!(pdf.contains("stream\n2.8346 0 0 2.8346 0 0 cm\n"));
    }

    #[test]
    fn content_stream_length_matches() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        canvas.draw_path(0.0, 0.0, &Path::circle(5.0, 5.0, 2.0));
        let pdf = export(&canvas, &ExportOptions::default()).unwrap();
        let start = pdf.find("stream\n").unwrap() + "stream\n".len();
        let end = pdf.find("endstream").unwrap();
        let length: usize = pdf[pdf.find("/Length ").unwrap() + 8..].split(' ').next().unwrap().parse().unwrap();
        assert_eq!(end - start, length);
    }

    #[test]
    fn fill_and_stroke_operators() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        let square = Path::rectangle(1.0, 1.0, 2.0, 2.0);
        canvas.set_color(Color::RED).draw_path(0.0, 0.0, &square);
        canvas
            .set_stroke(Color::BLUE, StrokeStyle::new(0.5).cap(LineCap::Round).dashes(&[1.0, 2.0], 0.0))
            .draw_path(0.0, 0.0, &square);
        canvas.set_fill(None).draw_path(0.0, 0.0, &square);
        let pdf = export(&canvas, &ExportOptions::default()).unwrap();
        assert!(pdf.contains("1 0 0 rg\n1 1 m\n3 1 l\n3 3 l\n1 3 l\nh\nf\n"));
        assert!(pdf.contains("0 0 1 RG\n0.5 w\n1 J 0 j 4 M\n[1 2] 0 d\n"));
        assert!(pdf.contains("h\nB\n"));
        assert!(pdf.contains("h\nS\n"));
    }

    #[test]
    fn translucency_is_blended_or_rejected() {
        let mut canvas = Canvas::open(10.0, 10.0).unwrap();
        canvas.set_color(Color::rgba(0.0, 0.0, 0.0, 0.5));
        canvas.draw_path(0.0, 0.0, &Path::rectangle(0.0, 0.0, 1.0, 1.0));
        let blended = export(&canvas, &ExportOptions::default()).unwrap();
        assert!(blended.contains("0.5 0.5 0.5 rg"));
        let options = ExportOptions { alpha: AlphaMode::Reject, ..ExportOptions::default() };
        assert!(matches!(export(&canvas, &options), Err(Error::UnsupportedFeature(_))));
    }
}
