//! Uncompressed band backed by one contiguous array.

use ndarray::{s, Array2, ArrayView2};

use crate::band::Band;
use crate::error::Result;
use crate::grid::Region;
use crate::types::Element;

/// A band held as a single row-major `Array2`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseBand<T: Element> {
    data: Array2<T>,
}

impl<T: Element> DenseBand<T> {
    /// Create a band of `size`, filled with `initval` or the element default.
    pub fn new(size: (usize, usize), initval: Option<T>) -> Self {
        Self {
            data: Array2::from_elem(size, initval.unwrap_or_default()),
        }
    }

    /// Wrap an existing array.
    pub fn from_array(data: Array2<T>) -> Self {
        Self { data }
    }

    pub fn as_array(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }
}

impl<T: Element> Band<T> for DenseBand<T> {
    fn size(&self) -> (usize, usize) {
        self.data.dim()
    }

    fn get_block(&self, row_off: usize, col_off: usize, n_rows: usize, n_cols: usize) -> Result<Array2<T>> {
        let region = Region::new(row_off, col_off, n_rows, n_cols);
        region.check_within(self.size())?;
        Ok(self
            .data
            .slice(s![row_off..region.row_end(), col_off..region.col_end()])
            .to_owned())
    }

    fn set_block(&mut self, row_off: usize, col_off: usize, block: ArrayView2<'_, T>) -> Result<()> {
        let (n_rows, n_cols) = block.dim();
        let region = Region::new(row_off, col_off, n_rows, n_cols);
        region.check_within(self.size())?;
        self.data
            .slice_mut(s![row_off..region.row_end(), col_off..region.col_end()])
            .assign(&block);
        Ok(())
    }
}
