//! Block compressors for chunk storage.
//!
//! A chunked band hands each chunk to a [`Compressor`] as raw bytes together
//! with the element width. Implementations must round-trip exactly:
//! `decompress(compress(b, w)) == b` for every input.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{BandError, Result};

/// Lossless byte-oriented block compressor.
pub trait Compressor: Send + Sync + std::fmt::Debug {
    /// Compress `raw`, a buffer of elements `element_width` bytes wide.
    fn compress(&self, raw: &[u8], element_width: usize) -> Result<Vec<u8>>;

    /// Restore the exact bytes given to [`Compressor::compress`].
    fn decompress(&self, blob: &[u8]) -> Result<Vec<u8>>;

    /// Short codec name for logs and stats.
    fn name(&self) -> &'static str;
}

/// Stores chunks verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompressor;

impl Compressor for IdentityCompressor {
    fn compress(&self, raw: &[u8], _element_width: usize) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, blob: &[u8]) -> Result<Vec<u8>> {
        Ok(blob.to_vec())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Stream format used by [`FlateCompressor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlateFormat {
    /// Raw deflate stream.
    Deflate,
    /// Deflate with zlib header and adler32 trailer.
    Zlib,
}

/// flate2-backed compressor with an optional byte shuffle filter.
///
/// Blob layout: one header byte holding the shuffle width (0 when the
/// filter was not applied), followed by the compressed stream.
#[derive(Debug, Clone, Copy)]
pub struct FlateCompressor {
    format: FlateFormat,
    level: u32,
    shuffle: bool,
}

impl FlateCompressor {
    /// Create a compressor. `level` is clamped to 0-9.
    pub fn new(format: FlateFormat, level: u32, shuffle: bool) -> Self {
        Self {
            format,
            level: level.min(9),
            shuffle,
        }
    }

    /// Zlib at the fast level with shuffling, used when nothing is configured.
    pub fn fast() -> Self {
        Self::new(FlateFormat::Zlib, 1, true)
    }
}

impl Default for FlateCompressor {
    fn default() -> Self {
        Self::fast()
    }
}

impl Compressor for FlateCompressor {
    fn compress(&self, raw: &[u8], element_width: usize) -> Result<Vec<u8>> {
        let width = if self.shuffle && element_width > 1 && element_width <= u8::MAX as usize {
            element_width
        } else {
            0
        };

        let shuffled;
        let payload = if width > 0 {
            shuffled = shuffle(raw, width);
            &shuffled[..]
        } else {
            raw
        };

        let mut out = vec![width as u8];
        let level = Compression::new(self.level);
        match self.format {
            FlateFormat::Deflate => {
                let mut encoder = DeflateEncoder::new(out, level);
                encoder.write_all(payload)?;
                out = encoder.finish()?;
            }
            FlateFormat::Zlib => {
                let mut encoder = ZlibEncoder::new(out, level);
                encoder.write_all(payload)?;
                out = encoder.finish()?;
            }
        }
        Ok(out)
    }

    fn decompress(&self, blob: &[u8]) -> Result<Vec<u8>> {
        let (&width, stream) = blob
            .split_first()
            .ok_or_else(|| BandError::compression("empty blob"))?;

        let mut raw = Vec::new();
        match self.format {
            FlateFormat::Deflate => {
                DeflateDecoder::new(stream).read_to_end(&mut raw)?;
            }
            FlateFormat::Zlib => {
                ZlibDecoder::new(stream).read_to_end(&mut raw)?;
            }
        }

        if width > 0 {
            Ok(unshuffle(&raw, width as usize))
        } else {
            Ok(raw)
        }
    }

    fn name(&self) -> &'static str {
        match self.format {
            FlateFormat::Deflate => "deflate",
            FlateFormat::Zlib => "zlib",
        }
    }
}

/// Group byte `j` of every element together. Trailing bytes that do not
/// form a whole element are copied unchanged.
fn shuffle(raw: &[u8], width: usize) -> Vec<u8> {
    let n = raw.len() / width;
    let mut out = vec![0u8; raw.len()];
    for i in 0..n {
        for j in 0..width {
            out[j * n + i] = raw[i * width + j];
        }
    }
    out[n * width..].copy_from_slice(&raw[n * width..]);
    out
}

fn unshuffle(shuffled: &[u8], width: usize) -> Vec<u8> {
    let n = shuffled.len() / width;
    let mut out = vec![0u8; shuffled.len()];
    for i in 0..n {
        for j in 0..width {
            out[i * width + j] = shuffled[j * n + i];
        }
    }
    out[n * width..].copy_from_slice(&shuffled[n * width..]);
    out
}
