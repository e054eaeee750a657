//! Export settings, loadable from TOML:
//!
//! ```toml
//! precision = 6
//! tolerance = 0.005
//! alpha = "reject"
//!
//! [raster]
//! scale = 2.0
//! background = "#ffffff"
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;
use crate::format::DEFAULT_PRECISION;
use crate::path::DEFAULT_TOLERANCE;

/// PostScript points per millimetre.
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// What exporters without an alpha channel do with translucent colours.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    /// Composite over a white page and emit the opaque result.
    #[default]
    Blend,
    /// Fail with `Error::UnsupportedFeature`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Significant digits of numbers in text formats.
    pub precision: usize,
    /// Flattening tolerance in scene units.
    pub tolerance: f64,
    /// Output points per scene unit for the page and line-art formats.
    pub points_per_unit: f64,
    pub alpha: AlphaMode,
    pub raster: RasterOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Pixels per scene unit.
    pub scale: f64,
    /// Fill behind the scene; transparent when unset.
    pub background: Option<Color>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            tolerance: DEFAULT_TOLERANCE,
            points_per_unit: POINTS_PER_MM,
            alpha: AlphaMode::Blend,
            raster: RasterOptions::default(),
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { scale: 1.0, background: None }
    }
}

impl ExportOptions {
    pub fn from_toml(text: &str) -> Result<ExportOptions> {
        let options: ExportOptions = toml::from_str(text)?;
        Ok(options.sanitized())
    }

    /// Clamps out-of-range values to usable ones.
    pub fn sanitized(mut self) -> ExportOptions {
        let defaults = ExportOptions::default();
        self.precision = self.precision.clamp(1, 15);
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            self.tolerance = defaults.tolerance;
        }
        if !(self.points_per_unit.is_finite() && self.points_per_unit > 0.0) {
            self.points_per_unit = defaults.points_per_unit;
        }
        if !(self.raster.scale.is_finite() && self.raster.scale > 0.0) {
            self.raster.scale = defaults.raster.scale;
        }
        self
    }

    pub fn with_scale(mut self, scale: f64) -> ExportOptions {
        self.raster.scale = scale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(ExportOptions::from_toml("").unwrap(), ExportOptions::default());
    }

    #[test]
    fn sections_and_colours() {
        let options = ExportOptions::from_toml(
            r##"
            precision = 40
            alpha = "reject"

            [raster]
            scale = 2.5
            background = "#ff0000"
            "##,
        )
        .unwrap();
        assert_eq!(options.precision, 15);
        assert_eq!(options.alpha, AlphaMode::Reject);
        assert_eq!(options.raster.scale, 2.5);
        assert_eq!(options.raster.background, Some(Color::RED));
        assert_eq!(options.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn bad_values_are_errors_or_clamped() {
        assert!(ExportOptions::from_toml("alpha = \"maybe\"").is_err());
        assert!(ExportOptions::from_toml("[raster]\nbackground = \"red\"").is_err());
        let options = ExportOptions::from_toml("tolerance = -1.0\n[raster]\nscale = 0.0").unwrap();
        assert_eq!(options.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(options.raster.scale, 1.0);
    }
}
