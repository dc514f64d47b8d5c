//! Chunked band with lazily allocated, compressed chunks.
//!
//! The band's domain is cut into a grid of `chunk_size` tiles. Every slot of
//! the chunk table starts `Unset` and only becomes `Set` when a write first
//! touches it; reads of unset chunks produce the fill value without
//! allocating anything.

use std::sync::Arc;

use bytes::Bytes;
use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::band::Band;
use crate::codec::Compressor;
use crate::config::BandConfig;
use crate::error::{BandError, Result};
use crate::grid::{ChunkGrid, ChunkSpan, Region};
use crate::types::{ChunkState, ChunkStats, Element};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Unset,
    Set(Bytes),
}

/// A band stored as independently compressed chunks.
#[derive(Debug, Clone)]
pub struct ChunkedBand<T: Element> {
    grid: ChunkGrid,
    fill_value: T,
    chunks: Vec<Chunk>,
    compressor: Arc<dyn Compressor>,
    parallel_threshold: usize,
}

impl<T: Element> ChunkedBand<T> {
    /// Create a band with an explicit compressor.
    pub fn new(
        size: (usize, usize),
        chunk_size: (usize, usize),
        fill_value: T,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self> {
        let grid = ChunkGrid::new(size, chunk_size)?;
        debug!(
            nrows = size.0,
            ncols = size.1,
            nchunks = grid.len(),
            codec = compressor.name(),
            "creating chunked band"
        );
        Ok(Self {
            chunks: vec![Chunk::Unset; grid.len()],
            grid,
            fill_value,
            compressor,
            parallel_threshold: BandConfig::default().parallel_threshold,
        })
    }

    /// Create a band from a configuration.
    pub fn with_config(size: (usize, usize), fill_value: T, config: &BandConfig) -> Result<Self> {
        config.validate().map_err(BandError::Config)?;
        let mut band = Self::new(size, config.chunk_size(), fill_value, config.build_compressor())?;
        band.parallel_threshold = config.parallel_threshold;
        Ok(band)
    }

    /// Minimum number of chunks a call must touch before its codec work
    /// runs on the rayon pool.
    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = threshold;
    }

    pub fn chunk_size(&self) -> (usize, usize) {
        self.grid.chunk_size()
    }

    pub fn fill_value(&self) -> T {
        self.fill_value
    }

    pub fn nchunkrows(&self) -> usize {
        self.grid.nchunkrows()
    }

    pub fn nchunkcols(&self) -> usize {
        self.grid.nchunkcols()
    }

    pub fn compressor(&self) -> &Arc<dyn Compressor> {
        &self.compressor
    }

    /// State of one chunk, by row-major index.
    pub fn chunk_status(&self, index: usize) -> Option<ChunkState> {
        self.chunks.get(index).map(|chunk| match chunk {
            Chunk::Unset => ChunkState::Unset,
            Chunk::Set(_) => ChunkState::Set,
        })
    }

    /// State of every chunk, row-major.
    pub fn chunk_states(&self) -> Vec<ChunkState> {
        (0..self.chunks.len())
            .filter_map(|i| self.chunk_status(i))
            .collect()
    }

    /// Storage statistics.
    pub fn stats(&self) -> ChunkStats {
        let chunk_bytes = (self.grid.chunk_len() * T::TYPE.width()) as u64;
        let mut stats = ChunkStats {
            total: self.chunks.len(),
            ..Default::default()
        };
        for chunk in &self.chunks {
            if let Chunk::Set(blob) = chunk {
                stats.set += 1;
                stats.compressed_bytes += blob.len() as u64;
                stats.raw_bytes += chunk_bytes;
            }
        }
        stats
    }

    fn decode(&self, blob: &[u8]) -> Result<Array2<T>> {
        let raw = self.compressor.decompress(blob)?;
        let expected = self.grid.chunk_len() * T::TYPE.width();
        if raw.len() != expected {
            return Err(BandError::compression(format!(
                "chunk decompressed to {} bytes, expected {}",
                raw.len(),
                expected
            )));
        }
        let values: Vec<T> = bytemuck::pod_collect_to_vec(&raw);
        Array2::from_shape_vec(self.grid.chunk_size(), values)
            .map_err(|e| BandError::compression(e.to_string()))
    }

    fn encode(&self, chunk: &Array2<T>) -> Result<Bytes> {
        let owned: Vec<T>;
        let values = match chunk.as_slice() {
            Some(values) => values,
            None => {
                owned = chunk.iter().copied().collect();
                &owned
            }
        };
        let blob = self
            .compressor
            .compress(bytemuck::cast_slice(values), T::TYPE.width())?;
        Ok(Bytes::from(blob))
    }

    /// Full chunk contents; unset chunks come back filled with the fill value.
    fn load(&self, index: usize) -> Result<Array2<T>> {
        match &self.chunks[index] {
            Chunk::Set(blob) => self.decode(blob),
            Chunk::Unset => Ok(Array2::from_elem(self.grid.chunk_size(), self.fill_value)),
        }
    }

    fn use_parallel(&self, touched: usize) -> bool {
        self.parallel_threshold > 0 && touched >= self.parallel_threshold
    }
}

impl<T: Element> Band<T> for ChunkedBand<T> {
    fn size(&self) -> (usize, usize) {
        self.grid.size()
    }

    fn get_block(&self, row_off: usize, col_off: usize, n_rows: usize, n_cols: usize) -> Result<Array2<T>> {
        let region = Region::new(row_off, col_off, n_rows, n_cols);
        region.check_within(self.size())?;
        trace!(row_off, col_off, n_rows, n_cols, "get_block");

        let mut out = Array2::from_elem((n_rows, n_cols), self.fill_value);

        let set: Vec<ChunkSpan> = self
            .grid
            .spans(region)
            .filter(|span| matches!(self.chunks[span.index], Chunk::Set(_)))
            .collect();

        let fetch = |span: &ChunkSpan| self.load(span.index).map(|chunk| (*span, chunk));
        let decoded: Vec<(ChunkSpan, Array2<T>)> = if self.use_parallel(set.len()) {
            set.par_iter().map(fetch).collect::<Result<_>>()?
        } else {
            set.iter().map(fetch).collect::<Result<_>>()?
        };

        for (span, chunk) in decoded {
            let o = span.overlap(&region);
            out.slice_mut(s![o.local_rows.clone(), o.local_cols.clone()])
                .assign(&chunk.slice(s![o.chunk_rows.clone(), o.chunk_cols.clone()]));
        }
        Ok(out)
    }

    fn set_block(&mut self, row_off: usize, col_off: usize, block: ArrayView2<'_, T>) -> Result<()> {
        let (n_rows, n_cols) = block.dim();
        let region = Region::new(row_off, col_off, n_rows, n_cols);
        region.check_within(self.size())?;
        trace!(row_off, col_off, n_rows, n_cols, "set_block");

        let spans: Vec<ChunkSpan> = self.grid.spans(region).collect();

        // Every touched chunk is recompressed before any slot changes, so a
        // codec failure leaves the table as it was.
        let rewrite = |span: &ChunkSpan| -> Result<(usize, Bytes)> {
            let mut chunk = self.load(span.index)?;
            let o = span.overlap(&region);
            chunk
                .slice_mut(s![o.chunk_rows.clone(), o.chunk_cols.clone()])
                .assign(&block.slice(s![o.local_rows.clone(), o.local_cols.clone()]));
            Ok((span.index, self.encode(&chunk)?))
        };
        let blobs: Vec<(usize, Bytes)> = if self.use_parallel(spans.len()) {
            spans.par_iter().map(rewrite).collect::<Result<_>>()?
        } else {
            spans.iter().map(rewrite).collect::<Result<_>>()?
        };

        for (index, blob) in blobs {
            if self.chunks[index] == Chunk::Unset {
                debug!(chunk = index, bytes = blob.len(), "materialized chunk");
            }
            self.chunks[index] = Chunk::Set(blob);
        }
        Ok(())
    }
}
