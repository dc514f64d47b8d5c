//! The band contract shared by dense and chunked storage.

use ndarray::{s, Array2, ArrayD, ArrayView2, Axis, Ix2};

use crate::error::{BandError, Result};
use crate::key::{BandKey, IndexKind, Selection, Value};
use crate::types::{Element, ElementType};

/// A two-dimensional grid of `T` with a fixed size.
///
/// Implementors provide block access; the strided and scalar surface on top
/// of it (`read_selection`, `read`, `write`) is shared.
pub trait Band<T: Element> {
    /// `(nrows, ncols)`.
    fn size(&self) -> (usize, usize);

    fn element_type(&self) -> ElementType {
        T::TYPE
    }

    /// Copy out the rectangle starting at `(row_off, col_off)`.
    fn get_block(&self, row_off: usize, col_off: usize, n_rows: usize, n_cols: usize)
        -> Result<Array2<T>>;

    /// Store `block` with its top-left corner at `(row_off, col_off)`.
    fn set_block(&mut self, row_off: usize, col_off: usize, block: ArrayView2<'_, T>) -> Result<()>;

    /// Read the cells picked by two axis selections.
    ///
    /// Fetches the bounding block once and sub-samples it by stride.
    fn read_selection(&self, rows: &Selection, cols: &Selection) -> Result<Array2<T>> {
        if rows.is_empty() || cols.is_empty() {
            return Ok(Array2::default((rows.len, cols.len)));
        }
        let (r0, nr) = rows.bounds();
        let (c0, nc) = cols.bounds();
        let block = self.get_block(r0, c0, nr, nc)?;
        if rows.is_contiguous() && cols.is_contiguous() {
            return Ok(block);
        }
        Ok(block.slice(s![..;rows.step, ..;cols.step]).to_owned())
    }

    /// Write `values` into the cells picked by two axis selections.
    ///
    /// Strided writes read the bounding block, overlay it at stride and store
    /// the whole block back.
    fn write_selection(
        &mut self,
        rows: &Selection,
        cols: &Selection,
        values: ArrayView2<'_, T>,
    ) -> Result<()> {
        if values.dim() != (rows.len, cols.len) {
            return Err(BandError::shape_mismatch(&[rows.len, cols.len], values.shape()));
        }
        if rows.is_empty() || cols.is_empty() {
            return Ok(());
        }
        let (r0, nr) = rows.bounds();
        let (c0, nc) = cols.bounds();
        if rows.is_contiguous() && cols.is_contiguous() {
            return self.set_block(r0, c0, values);
        }
        let mut block = self.get_block(r0, c0, nr, nc)?;
        block
            .slice_mut(s![..;rows.step, ..;cols.step])
            .assign(&values);
        self.set_block(r0, c0, block.view())
    }

    /// Scalar/slice read. Integer components collapse their axis.
    fn read(&self, key: &BandKey) -> Result<ArrayD<T>> {
        let resolved = ResolvedKey::new(key, self.size())?;
        let block = self.read_selection(&resolved.rows, &resolved.cols)?;
        Ok(resolved.collapse(block))
    }

    /// Scalar/slice write. A scalar value is broadcast over the destination.
    fn write(&mut self, key: &BandKey, value: Value<T>) -> Result<()> {
        let resolved = ResolvedKey::new(key, self.size())?;
        let values = conform(value, resolved.dest(), resolved.collapsed())?;
        self.write_selection(&resolved.rows, &resolved.cols, values.view())
    }
}

/// A band key resolved against a band's size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedKey {
    pub rows: Selection,
    pub cols: Selection,
    pub collapse_rows: bool,
    pub collapse_cols: bool,
}

impl ResolvedKey {
    pub fn new(key: &BandKey, (nrows, ncols): (usize, usize)) -> Result<Self> {
        match key {
            BandKey::Row(i) => Ok(Self {
                rows: Selection::wrapped(*i, nrows, "row")?,
                cols: Selection::all(ncols),
                collapse_rows: true,
                collapse_cols: false,
            }),
            BandKey::Rows(slice) => Ok(Self {
                rows: Selection::from_slice(slice, nrows)?,
                cols: Selection::all(ncols),
                collapse_rows: false,
                collapse_cols: false,
            }),
            BandKey::Cell(row, col) => Self::from_parts(row, col, (nrows, ncols)),
        }
    }

    pub fn from_parts(row: &IndexKind, col: &IndexKind, (nrows, ncols): (usize, usize)) -> Result<Self> {
        Ok(Self {
            rows: row.resolve(nrows, "row")?,
            cols: col.resolve(ncols, "column")?,
            collapse_rows: row.collapses(),
            collapse_cols: col.collapses(),
        })
    }

    /// `(rows, cols)` of the selected block before collapsing.
    pub fn dest(&self) -> (usize, usize) {
        (self.rows.len, self.cols.len)
    }

    pub fn collapsed(&self) -> (bool, bool) {
        (self.collapse_rows, self.collapse_cols)
    }

    /// Drop integer-addressed axes: columns first, then rows.
    pub fn collapse<T>(&self, block: Array2<T>) -> ArrayD<T> {
        let mut out = block.into_dyn();
        if self.collapse_cols {
            out = out.index_axis_move(Axis(1), 0);
        }
        if self.collapse_rows {
            out = out.index_axis_move(Axis(0), 0);
        }
        out
    }
}

/// Check that a value of shape `actual` can fill a `(rows, cols)` destination.
///
/// The value must have the destination shape, or that shape with its
/// integer-addressed axes dropped. A 0-d value fits a single cell.
pub(crate) fn check_value_shape(
    actual: &[usize],
    (rows, cols): (usize, usize),
    (collapse_rows, collapse_cols): (bool, bool),
) -> Result<()> {
    let reduced: Vec<usize> = [(rows, collapse_rows), (cols, collapse_cols)]
        .iter()
        .filter(|(_, collapsed)| !collapsed)
        .map(|&(d, _)| d)
        .collect();
    let fits = actual == [rows, cols]
        || actual == reduced.as_slice()
        || (actual.is_empty() && rows == 1 && cols == 1);
    if fits {
        Ok(())
    } else {
        Err(BandError::shape_mismatch(&[rows, cols], actual))
    }
}

/// Turn a value into a dense `(rows, cols)` block.
pub(crate) fn conform<T: Element>(
    value: Value<T>,
    shape: (usize, usize),
    collapsed: (bool, bool),
) -> Result<Array2<T>> {
    match value {
        Value::Scalar(v) => Ok(Array2::from_elem(shape, v)),
        Value::Array(array) => {
            let actual = array.shape().to_vec();
            check_value_shape(&actual, shape, collapsed)?;
            let mismatch = |_| BandError::shape_mismatch(&[shape.0, shape.1], &actual);
            if actual == [shape.0, shape.1] {
                return array.into_dimensionality::<Ix2>().map_err(mismatch);
            }
            // Only length-one axes differ, so logical order is preserved.
            let values: Vec<T> = array.iter().copied().collect();
            Array2::from_shape_vec(shape, values).map_err(mismatch)
        }
    }
}
