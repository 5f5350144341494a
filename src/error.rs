//! Error types for slicewand.
//!
//! Only genuine faults surface here. "Nothing selected" outcomes such as an
//! out-of-bounds seed or too few key frames are ordinary empty results.

use thiserror::Error;

use crate::session::SmartTool;

/// Result type alias for slicewand operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Pixel buffer length does not match the declared dimensions.
    #[error("pixel buffer of length {len} does not match {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Zero-width or zero-height raster.
    #[error("raster has zero width or height")]
    EmptyRaster,

    #[error("invalid raster shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Configuration value out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no smart tool is active")]
    NoActiveTool,

    /// The active tool cannot service the requested operation.
    #[error("active tool {active:?} does not support {operation}")]
    ToolMismatch {
        active: SmartTool,
        operation: &'static str,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
