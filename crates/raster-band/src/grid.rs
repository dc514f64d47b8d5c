//! Region arithmetic over a band's chunk grid.
//!
//! Both the read and the write path of [`crate::ChunkedBand`] walk the chunks
//! of a request through [`ChunkGrid::spans`] and place data with
//! [`ChunkSpan::overlap`], so a write followed by a read of the same
//! rectangle touches exactly the same cells.

use std::ops::Range;

use crate::error::{BandError, Result};

/// A rectangle of cells: offset plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub row_off: usize,
    pub col_off: usize,
    pub n_rows: usize,
    pub n_cols: usize,
}

impl Region {
    pub fn new(row_off: usize, col_off: usize, n_rows: usize, n_cols: usize) -> Self {
        Self {
            row_off,
            col_off,
            n_rows,
            n_cols,
        }
    }

    pub fn row_end(&self) -> usize {
        self.row_off + self.n_rows
    }

    pub fn col_end(&self) -> usize {
        self.col_off + self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.n_cols == 0
    }

    /// Fail with `OutOfRange` unless the region lies inside `[0, size)`.
    ///
    /// Offsets so large that `offset + extent` overflows are out of range too.
    pub fn check_within(&self, size: (usize, usize)) -> Result<()> {
        check_axis("row", self.row_off, self.n_rows, size.0)?;
        check_axis("column", self.col_off, self.n_cols, size.1)
    }
}

fn check_axis(axis: &'static str, off: usize, extent: usize, size: usize) -> Result<()> {
    match off.checked_add(extent) {
        Some(end) if end <= size => Ok(()),
        end => Err(BandError::out_of_range(
            axis,
            to_isize(off),
            end.map_or(isize::MAX, to_isize),
            size,
        )),
    }
}

fn to_isize(v: usize) -> isize {
    isize::try_from(v).unwrap_or(isize::MAX)
}

/// Partition of a band's domain into fixed-size chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGrid {
    size: (usize, usize),
    chunk_size: (usize, usize),
    nchunkrows: usize,
    nchunkcols: usize,
}

impl ChunkGrid {
    /// Create a grid. Chunk dimensions must be non-zero.
    pub fn new(size: (usize, usize), chunk_size: (usize, usize)) -> Result<Self> {
        if chunk_size.0 == 0 || chunk_size.1 == 0 {
            return Err(BandError::Config(format!(
                "chunk size {:?} must be non-zero",
                chunk_size
            )));
        }
        Ok(Self {
            size,
            chunk_size,
            nchunkrows: size.0.div_ceil(chunk_size.0),
            nchunkcols: size.1.div_ceil(chunk_size.1),
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn chunk_size(&self) -> (usize, usize) {
        self.chunk_size
    }

    pub fn nchunkrows(&self) -> usize {
        self.nchunkrows
    }

    pub fn nchunkcols(&self) -> usize {
        self.nchunkcols
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.nchunkrows * self.nchunkcols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements in one (full-size) chunk.
    pub fn chunk_len(&self) -> usize {
        self.chunk_size.0 * self.chunk_size.1
    }

    /// Row-major chunk index.
    pub fn chunk_index(&self, chunk_row: usize, chunk_col: usize) -> usize {
        chunk_row * self.nchunkcols + chunk_col
    }

    /// Enumerate the chunks touched by `region`, row-major.
    pub fn spans(&self, region: Region) -> ChunkSpans {
        let (ch, cw) = self.chunk_size;
        let (rows, cols) = if region.is_empty() {
            (0..0, 0..0)
        } else {
            (
                region.row_off / ch..region.row_end().div_ceil(ch),
                region.col_off / cw..region.col_end().div_ceil(cw),
            )
        };
        ChunkSpans {
            grid: *self,
            next_row: rows.start,
            next_col: cols.start,
            rows,
            cols,
        }
    }
}

/// One chunk touched by a region, with its domain clipped to the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: usize,
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

/// Where a chunk and a region intersect, in both coordinate frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    /// Rows relative to the chunk origin.
    pub chunk_rows: Range<usize>,
    /// Columns relative to the chunk origin.
    pub chunk_cols: Range<usize>,
    /// Rows relative to the region origin.
    pub local_rows: Range<usize>,
    /// Columns relative to the region origin.
    pub local_cols: Range<usize>,
}

impl ChunkSpan {
    /// Intersection of this chunk's domain with `region`.
    pub fn overlap(&self, region: &Region) -> Overlap {
        let r0 = region.row_off.max(self.row_start);
        let r1 = region.row_end().min(self.row_end);
        let c0 = region.col_off.max(self.col_start);
        let c1 = region.col_end().min(self.col_end);

        Overlap {
            chunk_rows: r0 - self.row_start..r1 - self.row_start,
            chunk_cols: c0 - self.col_start..c1 - self.col_start,
            local_rows: r0 - region.row_off..r1 - region.row_off,
            local_cols: c0 - region.col_off..c1 - region.col_off,
        }
    }
}

/// Iterator returned by [`ChunkGrid::spans`].
#[derive(Debug, Clone)]
pub struct ChunkSpans {
    grid: ChunkGrid,
    rows: Range<usize>,
    cols: Range<usize>,
    next_row: usize,
    next_col: usize,
}

impl Iterator for ChunkSpans {
    type Item = ChunkSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cols.is_empty() || self.next_row >= self.rows.end {
            return None;
        }

        let (i, j) = (self.next_row, self.next_col);
        let (ch, cw) = self.grid.chunk_size;
        let (nrows, ncols) = self.grid.size;

        self.next_col += 1;
        if self.next_col >= self.cols.end {
            self.next_col = self.cols.start;
            self.next_row += 1;
        }

        Some(ChunkSpan {
            index: self.grid.chunk_index(i, j),
            row_start: i * ch,
            row_end: ((i + 1) * ch).min(nrows),
            col_start: j * cw,
            col_end: ((j + 1) * cw).min(ncols),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflowing_region_is_out_of_range() {
        let huge = Region::new(usize::MAX, 0, 2, 1);
        assert!(matches!(
            huge.check_within((10, 10)),
            Err(BandError::OutOfRange { axis: "row", end: isize::MAX, .. })
        ));

        let wide = Region::new(0, 3, 1, usize::MAX);
        assert!(matches!(
            wide.check_within((10, 10)),
            Err(BandError::OutOfRange { axis: "column", .. })
        ));

        assert!(Region::new(8, 8, 2, 2).check_within((10, 10)).is_ok());
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        assert_eq!(grid.nchunkrows(), 3);
        assert_eq!(grid.nchunkcols(), 3);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.chunk_len(), 16);

        let exact = ChunkGrid::new((8, 12), (4, 4)).unwrap();
        assert_eq!((exact.nchunkrows(), exact.nchunkcols()), (2, 3));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkGrid::new((10, 10), (0, 4)),
            Err(BandError::Config(_))
        ));
    }

    #[test]
    fn test_spans_clip_edge_chunks() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        let spans: Vec<_> = grid.spans(Region::new(6, 6, 4, 4)).collect();
        assert_eq!(spans.len(), 4);
        assert_eq!(
            spans[0],
            ChunkSpan {
                index: 4,
                row_start: 4,
                row_end: 8,
                col_start: 4,
                col_end: 8
            }
        );
        assert_eq!(
            spans[3],
            ChunkSpan {
                index: 8,
                row_start: 8,
                row_end: 10,
                col_start: 8,
                col_end: 10
            }
        );
    }

    #[test]
    fn test_spans_are_row_major() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        let indices: Vec<_> = grid
            .spans(Region::new(2, 2, 6, 6))
            .map(|s| s.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_spans_restartable() {
        let grid = ChunkGrid::new((9, 9), (3, 3)).unwrap();
        let spans = grid.spans(Region::new(0, 0, 9, 9));
        assert_eq!(spans.clone().count(), 9);
        assert_eq!(spans.count(), 9);
    }

    #[test]
    fn test_empty_region_touches_nothing() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        assert_eq!(grid.spans(Region::new(5, 5, 0, 3)).count(), 0);
        assert_eq!(grid.spans(Region::new(5, 5, 3, 0)).count(), 0);
    }

    #[test]
    fn test_overlap_request_inside_chunk() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        let region = Region::new(5, 1, 2, 2);
        let span = grid.spans(region).next().unwrap();
        let overlap = span.overlap(&region);
        assert_eq!(overlap.chunk_rows, 1..3);
        assert_eq!(overlap.chunk_cols, 1..3);
        assert_eq!(overlap.local_rows, 0..2);
        assert_eq!(overlap.local_cols, 0..2);
    }

    #[test]
    fn test_overlap_chunk_inside_request() {
        let grid = ChunkGrid::new((10, 10), (4, 4)).unwrap();
        let region = Region::new(2, 2, 8, 8);
        let centre = grid.spans(region).find(|s| s.index == 4).unwrap();
        let overlap = centre.overlap(&region);
        assert_eq!(overlap.chunk_rows, 0..4);
        assert_eq!(overlap.chunk_cols, 0..4);
        assert_eq!(overlap.local_rows, 2..6);
        assert_eq!(overlap.local_cols, 2..6);

        let corner = grid.spans(region).last().unwrap();
        let overlap = corner.overlap(&region);
        assert_eq!(overlap.chunk_rows, 0..2);
        assert_eq!(overlap.local_rows, 6..8);
    }

    #[test]
    fn test_region_bounds() {
        assert!(Region::new(0, 0, 10, 10).check_within((10, 10)).is_ok());
        assert!(matches!(
            Region::new(8, 0, 3, 1).check_within((10, 10)),
            Err(BandError::OutOfRange { axis: "row", .. })
        ));
        assert!(matches!(
            Region::new(0, 9, 1, 2).check_within((10, 10)),
            Err(BandError::OutOfRange { axis: "column", .. })
        ));
    }
}
