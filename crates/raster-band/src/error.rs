//! Error types for band storage and indexing.

use thiserror::Error;

/// Errors that can occur while reading, writing or indexing bands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BandError {
    /// A requested offset or extent falls outside the band.
    #[error("{axis} range {start}..{end} is outside band extent 0..{size}")]
    OutOfRange {
        axis: &'static str,
        start: isize,
        end: isize,
        size: usize,
    },

    /// A value does not match the shape implied by its destination.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An index key, or one of its components, has an unsupported form.
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// The operation needs at least one band.
    #[error("no bands")]
    EmptyComposition,

    /// The codec failed, or produced a blob of the wrong length.
    #[error("compression error: {0}")]
    Compression(String),

    /// An ndarray shape or layout operation failed.
    #[error("array layout error: {0}")]
    Layout(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BandError {
    /// Create an OutOfRange error.
    pub fn out_of_range(axis: &'static str, start: isize, end: isize, size: usize) -> Self {
        Self::OutOfRange {
            axis,
            start,
            end,
            size,
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an UnsupportedKey error.
    pub fn unsupported_key(msg: impl Into<String>) -> Self {
        Self::UnsupportedKey(msg.into())
    }

    /// Create a Compression error.
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }
}

impl From<std::io::Error> for BandError {
    fn from(err: std::io::Error) -> Self {
        Self::Compression(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BandError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Layout(err.to_string())
    }
}

/// Result type for band operations.
pub type Result<T> = std::result::Result<T, BandError>;
