//! Chunked, compressed storage for two-dimensional raster bands.
//!
//! This crate stores large numeric grids in memory, either as one dense
//! array or as a grid of independently compressed chunks, and presents any
//! number of equally sized bands as a single `(rows, cols, bands)` array:
//!
//! - **Lazy chunks**: a chunk is allocated and compressed only when first written
//! - **Exact round-trip**: compression is lossless; reads return what was written
//! - **Numpy-style addressing**: integers, strided slices and boolean masks
//!
//! # Architecture
//!
//! ```text
//! BandIndexer::get(key) / set(key, value)
//!      │
//!      ├─► Resolve key into row/column selections and a band subset
//!      │
//!      ├─► For each selected band: read_selection / write_selection
//!      │         │
//!      │         ├─► DenseBand: slice the backing array
//!      │         │
//!      │         └─► ChunkedBand: map region to chunks (ChunkGrid::spans)
//!      │                   │
//!      │                   ├─► Unset chunk: fill value, nothing allocated
//!      │                   │
//!      │                   └─► Set chunk: decompress, copy overlap
//!      │                       (writes recompress and store the chunk)
//!      │
//!      └─► Collapse integer-addressed axes (band, then column, then row)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ndarray::Array2;
//! use raster_band::{Band, BandIndexer, ChunkedBand, DenseBand, FlateCompressor, Key};
//!
//! let mut elevation =
//!     ChunkedBand::new((10, 10), (4, 4), 0.0f32, Arc::new(FlateCompressor::fast()))?;
//! elevation.set_block(2, 2, Array2::from_elem((6, 6), 5.0).view())?;
//!
//! let mut slope = DenseBand::new((10, 10), Some(1.0f32));
//! let indexer = BandIndexer::new(vec![&mut elevation as &mut dyn Band<f32>, &mut slope])?;
//!
//! let cell = indexer.get(&"3, 3".parse::<Key>()?)?;
//! assert_eq!(cell.shape(), &[2]);
//! assert_eq!(cell.iter().copied().collect::<Vec<_>>(), vec![5.0, 1.0]);
//! # Ok::<(), raster_band::BandError>(())
//! ```

pub mod band;
pub mod chunked;
pub mod codec;
pub mod config;
pub mod dense;
pub mod error;
pub mod grid;
pub mod indexer;
pub mod key;
pub mod types;

// Re-export commonly used types at crate root
pub use band::Band;
pub use chunked::ChunkedBand;
pub use codec::{Compressor, FlateCompressor, FlateFormat, IdentityCompressor};
pub use config::{BandConfig, ChunkCompression};
pub use dense::DenseBand;
pub use error::{BandError, Result};
pub use grid::{ChunkGrid, ChunkSpan, Overlap, Region};
pub use indexer::{BandIndexer, Rows};
pub use key::{BandKey, IndexKind, Key, Selection, SliceSpec, Value};
pub use types::{ChunkState, ChunkStats, Element, ElementType};
