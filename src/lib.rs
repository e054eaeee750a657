//! Vector path construction, stroking and multi-format export.
//!
//! Geometry lives in a y-up space measured in millimetres. A [`Canvas`]
//! records drawing operations into a [`Scene`], which the exporters in
//! [`export`] turn into SVG, PDF, EPS or PNG artifacts.

mod arc;
mod canvas;
mod color;
mod config;
mod error;
mod flatten;
mod font;
mod format;
mod geom;
mod parse;
mod path;
mod rasterizer;
mod stroke;

pub mod export;

pub use canvas::*;
pub use color::*;
pub use config::*;
pub use error::*;
pub use export::{export, write_to, Exporter, Format};
pub use flatten::*;
pub use font::*;
pub use format::DEFAULT_PRECISION;
pub use geom::*;
pub use path::*;
pub use rasterizer::*;
pub use stroke::*;
