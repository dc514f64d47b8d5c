//! Core types shared by both band kinds.

use std::fmt::Debug;

use bytemuck::Pod;
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

/// Fixed-width numeric type stored in a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementType {
    /// Width of one element in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Parse from a numpy-style name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "u8" | "uint8" => Some(Self::U8),
            "u16" | "uint16" => Some(Self::U16),
            "u32" | "uint32" => Some(Self::U32),
            "u64" | "uint64" => Some(Self::U64),
            "i8" | "int8" => Some(Self::I8),
            "i16" | "int16" => Some(Self::I16),
            "i32" | "int32" => Some(Self::I32),
            "i64" | "int64" => Some(Self::I64),
            "f32" | "float32" => Some(Self::F32),
            "f64" | "float64" => Some(Self::F64),
            _ => None,
        }
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value that can be stored in a band.
///
/// `Pod` gives the byte view handed to the compressor; `NumCast` lets callers
/// convert plain numbers (config values, CLI arguments) into the element type.
pub trait Element: Pod + NumCast + Default + Debug + PartialEq + Send + Sync + 'static {
    const TYPE: ElementType;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const TYPE: ElementType = ElementType::$variant;
            }
        )*
    };
}

impl_element!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

/// Per-chunk allocation state of a chunked band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkState {
    /// Never written; reads return the fill value.
    Unset,
    /// Holds a compressed blob.
    Set,
}

/// Statistics about a chunked band's storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkStats {
    /// Number of chunks in the grid.
    pub total: usize,
    /// Number of chunks holding data.
    pub set: usize,
    /// Bytes held by compressed blobs.
    pub compressed_bytes: u64,
    /// Bytes the set chunks would occupy uncompressed.
    pub raw_bytes: u64,
}

impl ChunkStats {
    /// Ratio of raw to compressed size (0.0 when nothing is stored).
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            0.0
        } else {
            self.raw_bytes as f64 / self.compressed_bytes as f64
        }
    }

    /// Number of chunks that were never written.
    pub fn unset(&self) -> usize {
        self.total - self.set
    }
}
