use std::fmt;
use std::sync::Arc;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::font::{Face, Metrics};
use crate::geom::*;
use crate::path::Path;
use crate::stroke::StrokeStyle;

/// Stroke paint: a colour and the style the outline is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub style: StrokeStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathOp {
    pub path: Path,
    pub transform: Transform,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

impl PathOp {
    /// The path in scene coordinates.
    pub fn placed_path(&self) -> Path {
        if self.transform.is_identity() {
            self.path.clone()
        } else {
            self.path.transform(&self.transform)
        }
    }
}

/// Text set on a baseline starting at `position`. `outline` holds the glyph
/// outlines as resolved by the face at draw time, relative to `position`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub position: Point,
    pub text: String,
    pub outline: Path,
    pub color: Color,
    pub metrics: Metrics,
}

impl TextOp {
    pub fn placed_path(&self) -> Path {
        self.outline.translate(self.position.x, self.position.y)
    }
}

/// A recorded paint operation. Later operations paint over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Path(PathOp),
    Text(TextOp),
}

/// Canvas extents plus the ordered operation log. Scenes hold no I/O
/// state and can be exported any number of times.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    width: f64,
    height: f64,
    pub(crate) ops: Vec<Op>,
}

impl Scene {
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Union of the placed geometry of all operations, stroke outlines
    /// included.
    pub fn bounds(&self) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        for op in &self.ops {
            let r = match op {
                Op::Path(op) => {
                    let path = op.placed_path();
                    match &op.stroke {
                        Some(stroke) => path.stroke(&stroke.style).bounds().union(path.bounds()),
                        None => path.bounds(),
                    }
                }
                Op::Text(op) => op.placed_path().bounds(),
            };
            rect = Some(match rect {
                Some(acc) => acc.union(r),
                None => r,
            });
        }
        rect
    }
}

/// Records drawing calls into a [`Scene`].
///
/// Paint state (fill colour, stroke, font) is copied into each operation
/// when it is recorded; changing the state afterwards only affects later
/// calls.
pub struct Canvas {
    scene: Scene,
    fill: Option<Color>,
    stroke: Option<Stroke>,
    font: Option<Arc<dyn Face>>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("scene", &self.scene)
            .field("fill", &self.fill)
            .field("stroke", &self.stroke)
            .field("font", &self.font.as_ref().map(|face| face.metrics()))
            .finish()
    }
}

impl Canvas {
    /// Starts an empty canvas of `width × height` scene units. Paths are
    /// filled black and not stroked until told otherwise.
    pub fn open(width: f64, height: f64) -> Result<Canvas> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidExtents { width, height });
        }
        Ok(Canvas {
            scene: Scene { width, height, ops: Vec::new() },
            fill: Some(Color::BLACK),
            stroke: None,
            font: None,
        })
    }

    /// Sets the fill colour, which also paints text.
    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.fill = Some(color);
        self
    }

    /// `None` leaves paths unfilled.
    pub fn set_fill(&mut self, fill: Option<Color>) -> &mut Self {
        self.fill = fill;
        self
    }

    pub fn set_stroke(&mut self, color: Color, style: StrokeStyle) -> &mut Self {
        self.stroke = Some(Stroke { color, style });
        self
    }

    pub fn clear_stroke(&mut self) -> &mut Self {
        self.stroke = None;
        self
    }

    pub fn set_font(&mut self, face: Arc<dyn Face>) -> &mut Self {
        self.font = Some(face);
        self
    }

    pub fn font(&self) -> Option<&Arc<dyn Face>> {
        self.font.as_ref()
    }

    /// Records `path` placed with its origin at `(x, y)`.
    pub fn draw_path(&mut self, x: f64, y: f64, path: &Path) -> &mut Self {
        self.draw_path_transformed(Transform::translate(x, y), path)
    }

    pub fn draw_path_transformed(&mut self, transform: Transform, path: &Path) -> &mut Self {
        self.scene.ops.push(Op::Path(PathOp {
            path: path.clone(),
            transform,
            fill: self.fill,
            stroke: self.stroke.clone(),
        }));
        self
    }

    /// Records `text` with its baseline origin at `(x, y)`, using the
    /// current font and fill colour.
    pub fn draw_text(&mut self, x: f64, y: f64, text: &str) -> Result<&mut Self> {
        let face = self.font.as_ref().ok_or(Error::NoFont)?;
        let op = TextOp {
            position: Point::new(x, y),
            text: text.to_string(),
            outline: face.to_path(text),
            color: self.fill.unwrap_or(Color::TRANSPARENT),
            metrics: face.metrics(),
        };
        self.scene.ops.push(Op::Text(op));
        Ok(self)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn finish(self) -> Scene {
        self.scene
    }
}
