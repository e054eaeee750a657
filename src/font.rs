use crate::path::Path;

/// Vertical metrics of a face at its size, in scene units.
///
/// `ascent`, `cap_height` and `x_height` are measured upwards from the
/// baseline, `descent` downwards, so all are positive for ordinary faces.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Metrics {
    pub size: f64,
    pub ascent: f64,
    pub descent: f64,
    pub cap_height: f64,
    pub x_height: f64,
    pub line_height: f64,
}

/// A sized font face supplied by a font-handling collaborator.
///
/// The canvas never inspects font data; it only asks for metrics and glyph
/// outlines. Outlines are returned with the baseline origin at `(0, 0)` and
/// the y axis pointing up.
pub trait Face: Send + Sync {
    fn metrics(&self) -> Metrics;

    /// Advance width and height of `text` set on one line.
    fn bounds(&self, text: &str) -> (f64, f64);

    fn to_path(&self, text: &str) -> Path;
}
