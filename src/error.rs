//! Error types for the annotator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by image loading, cropping, export and configuration.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// An input file could not be read or decoded as an image.
    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The crop rectangle selects no pixels of the current image.
    #[error("Crop region is empty ({width}x{height})")]
    EmptyCrop { width: f32, height: f32 },

    /// Flattening or encoding the annotated canvas failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file is not valid JSON for the expected shape.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
