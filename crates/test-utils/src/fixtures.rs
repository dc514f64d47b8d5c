//! Common test fixtures for band tests.
//!
//! Pre-defined band extents and chunk shapes that cover the layouts chunked
//! storage has to get right: exact multiples, ragged edge chunks, a single
//! chunk larger than the band, and a layout large enough to go parallel.

/// Band extent and chunk shape pairs.
pub mod layout {
    /// The documented 10x10 band with 4x4 chunks (edge chunks are 2 wide).
    pub const SCENARIO: BandLayout = BandLayout {
        size: (10, 10),
        chunk_size: (4, 4),
    };

    /// Extent is an exact multiple of the chunk shape.
    pub const EXACT_MULTIPLE: BandLayout = BandLayout {
        size: (8, 8),
        chunk_size: (4, 4),
    };

    /// Neither axis divides evenly and chunks are not square.
    pub const MISALIGNED: BandLayout = BandLayout {
        size: (37, 53),
        chunk_size: (8, 16),
    };

    /// One chunk covers more than the whole band.
    pub const SINGLE_CHUNK: BandLayout = BandLayout {
        size: (3, 3),
        chunk_size: (8, 8),
    };

    /// Many chunks, enough to cross the default parallel threshold.
    pub const LARGE: BandLayout = BandLayout {
        size: (512, 512),
        chunk_size: (64, 64),
    };

    /// A band extent together with the chunk shape to store it in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BandLayout {
        pub size: (usize, usize),
        pub chunk_size: (usize, usize),
    }

    impl BandLayout {
        /// Number of chunk rows and chunk columns (ceiling division).
        pub fn chunk_grid(&self) -> (usize, usize) {
            (
                self.size.0.div_ceil(self.chunk_size.0),
                self.size.1.div_ceil(self.chunk_size.1),
            )
        }

        /// Total number of chunks.
        pub fn chunk_count(&self) -> usize {
            let (r, c) = self.chunk_grid();
            r * c
        }

        /// Total number of cells.
        pub fn cells(&self) -> usize {
            self.size.0 * self.size.1
        }
    }

    /// All layouts, for tests that loop over every shape.
    pub const ALL: [BandLayout; 5] = [SCENARIO, EXACT_MULTIPLE, MISALIGNED, SINGLE_CHUNK, LARGE];
}

/// Key strings in the textual form accepted by the key parsers.
pub mod keys {
    /// Every cell of every band.
    pub const FULL: &str = ":, :";

    /// A single cell, all bands.
    pub const CELL: &str = "3, 3";

    /// Reversed rows.
    pub const REVERSED_ROWS: &str = "::-1, :";

    /// Every other row and column.
    pub const STRIDED: &str = "::2, ::2";

    /// A single cell of the last band.
    pub const LAST_BAND_CELL: &str = "0, 0, -1";

    /// Four components, always rejected.
    pub const TOO_MANY: &str = "0, 0, 0, 0";
}

#[cfg(test)]
mod tests {
    use super::layout::*;

    #[test]
    fn test_scenario_chunk_grid() {
        assert_eq!(SCENARIO.chunk_grid(), (3, 3));
        assert_eq!(SCENARIO.chunk_count(), 9);
        assert_eq!(SCENARIO.cells(), 100);
    }

    #[test]
    fn test_single_chunk_layout() {
        assert_eq!(SINGLE_CHUNK.chunk_grid(), (1, 1));
    }

    #[test]
    fn test_misaligned_layout() {
        assert_eq!(MISALIGNED.chunk_grid(), (5, 4));
    }
}
