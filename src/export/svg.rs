use std::fmt::Write as _;

use crate::canvas::Scene;
use crate::color::Color;
use crate::config::ExportOptions;
use crate::error::Result;
use crate::format::num;
use crate::geom::*;
use crate::stroke::{LineCap, LineJoin};

use super::{items, Exporter};

/// Writes an SVG 1.1 document sized in millimetres whose user units are
/// scene units.
pub struct SvgExporter {
    options: ExportOptions,
}

impl SvgExporter {
    pub fn new(options: &ExportOptions) -> SvgExporter {
        SvgExporter { options: options.clone().sanitized() }
    }

    fn paint(&self, name: &str, color: Color, out: &mut String) {
        let [r, g, b, _] = color.to_rgba8();
        let _ = write!(out, " {}=\"#{:02x}{:02x}{:02x}\"", name, r, g, b);
        if !color.is_opaque() {
            let _ = write!(out, " {}-opacity=\"{}\"", name, num(color.a.clamp(0.0, 1.0) as f64, 3));
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl Exporter for SvgExporter {
    type Output = String;

    fn export(&self, scene: &Scene) -> Result<String> {
        let precision = self.options.precision;
        let n = |v: f64| num(v, precision);
        let (width, height) = (scene.width(), scene.height());
        // y down, origin top-left
        let flip = Transform::new(Mat2x2::scale(1.0, -1.0), Point::new(0.0, height));

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\">",
            w = n(width),
            h = n(height)
        );

        for item in items(scene) {
            out.push_str("<path d=\"");
            out.push_str(&item.path.transform(&flip).to_text_with_precision(precision));
            out.push('"');
            if let Some(text) = item.text {
                let _ = write!(out, " aria-label=\"{}\"", escape(text));
            }
            match item.fill {
                Some(color) => self.paint("fill", color, &mut out),
                None => out.push_str(" fill=\"none\""),
            }
            if let Some(stroke) = item.stroke {
                let style = &stroke.style;
                self.paint("stroke", stroke.color, &mut out);
                let _ = write!(out, " stroke-width=\"{}\"", n(style.width));
                match style.cap {
                    LineCap::Butt => {}
                    LineCap::Round => out.push_str(" stroke-linecap=\"round\""),
                    LineCap::Square => out.push_str(" stroke-linecap=\"square\""),
                }
                match style.join {
                    LineJoin::Miter => {
                        if style.miter_limit != 4.0 {
                            let _ = write!(out, " stroke-miterlimit=\"{}\"", n(style.miter_limit.max(1.0)));
                        }
                    }
                    LineJoin::Round => out.push_str(" stroke-linejoin=\"round\""),
                    LineJoin::Bevel => out.push_str(" stroke-linejoin=\"bevel\""),
                }
                if let Some(pattern) = style.dash_pattern() {
                    let dashes: Vec<String> = pattern.iter().map(|d| n(*d)).collect();
                    let _ = write!(out, " stroke-dasharray=\"{}\"", dashes.join(" "));
                    if style.dash_offset != 0.0 {
                        let _ = write!(out, " stroke-dashoffset=\"{}\"", n(style.dash_offset));
                    }
                }
            }
            out.push_str("/>\n");
        }

        out.push_str("</svg>\n");
        Ok(out)
    }
}
