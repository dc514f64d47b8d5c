//! Configuration for chunked bands.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{Compressor, FlateCompressor, FlateFormat, IdentityCompressor};

/// Configuration for chunked band storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandConfig {
    /// Chunk height in rows.
    pub chunk_rows: usize,

    /// Chunk width in columns.
    pub chunk_cols: usize,

    /// Compression codec for chunk blobs.
    pub compression: ChunkCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,

    /// Minimum number of chunks touched by one call before codec work is
    /// spread over the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            chunk_rows: 256,
            chunk_cols: 256,
            compression: ChunkCompression::Zlib,
            compression_level: 1,
            shuffle: true,
            parallel_threshold: 8,
        }
    }
}

impl BandConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("BAND_CHUNK_ROWS") {
            if let Ok(size) = val.parse() {
                config.chunk_rows = size;
            }
        }

        if let Ok(val) = std::env::var("BAND_CHUNK_COLS") {
            if let Ok(size) = val.parse() {
                config.chunk_cols = size;
            }
        }

        if let Ok(val) = std::env::var("BAND_COMPRESSION") {
            config.compression = ChunkCompression::from_str(&val);
        }

        if let Ok(val) = std::env::var("BAND_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("BAND_SHUFFLE") {
            config.shuffle = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("BAND_PARALLEL_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.parallel_threshold = threshold;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_rows == 0 || self.chunk_cols == 0 {
            return Err("chunk dimensions must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }

    /// Chunk dimensions as (rows, cols).
    pub fn chunk_size(&self) -> (usize, usize) {
        (self.chunk_rows, self.chunk_cols)
    }

    /// Build the compressor described by this configuration.
    pub fn build_compressor(&self) -> Arc<dyn Compressor> {
        let level = u32::from(self.compression_level);
        tracing::debug!(
            codec = %self.compression,
            level,
            shuffle = self.shuffle,
            "building chunk compressor"
        );
        match self.compression {
            ChunkCompression::None => Arc::new(IdentityCompressor),
            ChunkCompression::Deflate => {
                Arc::new(FlateCompressor::new(FlateFormat::Deflate, level, self.shuffle))
            }
            ChunkCompression::Zlib => {
                Arc::new(FlateCompressor::new(FlateFormat::Zlib, level, self.shuffle))
            }
        }
    }
}

/// Compression codec for chunk blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkCompression {
    /// No compression.
    None,
    /// Raw deflate.
    Deflate,
    /// Zlib-framed deflate (recommended).
    #[default]
    Zlib,
}

impl ChunkCompression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "deflate" => Self::Deflate,
            "zlib" => Self::Zlib,
            other => {
                tracing::warn!(codec = other, "unknown chunk compression, using zlib");
                Self::Zlib
            }
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Zlib => "zlib",
        }
    }
}

impl std::fmt::Display for ChunkCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
