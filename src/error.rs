use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers.
///
/// Degenerate geometry is never an error: stroking, dashing, flattening and
/// bounds queries produce empty results instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The path text could not be parsed. `position` is a byte offset.
    #[error("malformed path at byte {position}: {reason}")]
    MalformedPath { position: usize, reason: String },

    #[error("invalid canvas extents {width}x{height}: both must be positive")]
    InvalidExtents { width: f64, height: f64 },

    /// An exporter cannot represent something the scene asks for.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Encoding the artifact or committing it to the sink failed.
    #[error("export failed: {0}")]
    Export(String),

    #[error("no font face set before drawing text")]
    NoFont,

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Export(err.to_string())
    }
}
