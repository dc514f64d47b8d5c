//! Multi-band indexing facade.
//!
//! A [`BandIndexer`] borrows a list of bands of equal size and addresses them
//! as one `(rows, cols, bands)` array. It owns no grid data: every access
//! goes through the [`Band`] contract of the selected bands.

use ndarray::{s, stack, Array2, Array3, ArrayD, ArrayView2, Axis, Ix2, Zip};
use tracing::trace;

use crate::band::{check_value_shape, Band, ResolvedKey};
use crate::error::{BandError, Result};
use crate::key::{BandKey, IndexKind, Key, Selection, Value};
use crate::types::{Element, ElementType};

/// One or more bands addressed as a single array.
pub struct BandIndexer<'a, T: Element> {
    bands: Vec<&'a mut dyn Band<T>>,
}

impl<'a, T: Element> BandIndexer<'a, T> {
    /// Compose `bands`. All bands must share one size.
    pub fn new(bands: Vec<&'a mut dyn Band<T>>) -> Result<Self> {
        if let Some(first) = bands.first() {
            let size = first.size();
            if let Some(other) = bands.iter().find(|b| b.size() != size) {
                let other = other.size();
                return Err(BandError::shape_mismatch(&[size.0, size.1], &[other.0, other.1]));
            }
        }
        Ok(Self { bands })
    }

    /// Number of composed bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Shared `(nrows, ncols)` of the bands.
    pub fn size(&self) -> Result<(usize, usize)> {
        self.bands
            .first()
            .map(|b| b.size())
            .ok_or(BandError::EmptyComposition)
    }

    /// `[nrows, ncols]` for one band, `[n_bands, nrows, ncols]` otherwise.
    pub fn shape(&self) -> Result<Vec<usize>> {
        let (nrows, ncols) = self.size()?;
        if self.bands.len() == 1 {
            Ok(vec![nrows, ncols])
        } else {
            Ok(vec![self.bands.len(), nrows, ncols])
        }
    }

    /// Element type of the first band.
    pub fn element_type(&self) -> Result<ElementType> {
        self.bands
            .first()
            .map(|b| b.element_type())
            .ok_or(BandError::EmptyComposition)
    }

    /// Read through `key`.
    ///
    /// Index keys produce `(rows, cols, bands)` with integer-addressed axes
    /// collapsed (band axis first, then columns, then rows). A 2D mask
    /// yields `(k, n_bands)`, a 3D mask yields `(k,)`.
    pub fn get(&self, key: &Key) -> Result<ArrayD<T>> {
        match key {
            Key::Index { row, col, band } => self.get_index(row, col, band.as_ref()),
            Key::Mask(mask) => self.get_mask(mask),
        }
    }

    /// Write `value` through `key`.
    ///
    /// A value carrying a band axis (3D) is split along its last axis, one
    /// slice per selected band. Shapes are checked for every band before
    /// the first band is written.
    pub fn set(&mut self, key: &Key, value: Value<T>) -> Result<()> {
        match key {
            Key::Index { row, col, band } => self.set_index(row, col, band.as_ref(), value),
            Key::Mask(mask) => self.set_mask(mask, value),
        }
    }

    /// Iterate over rows. Restartable: every call starts again at row 0.
    pub fn rows(&self) -> Rows<'_, 'a, T> {
        Rows {
            indexer: self,
            row: 0,
            nrows: self.size().map(|s| s.0).unwrap_or(0),
        }
    }

    fn band_selection(&self, band: Option<&IndexKind>) -> Result<Vec<usize>> {
        let n = self.bands.len();
        let selection = match band {
            None => Selection::all(n),
            Some(kind) => kind.resolve(n, "band")?,
        };
        Ok((0..selection.len).map(|k| selection.position(k)).collect())
    }

    /// Fill `(rows, cols, bands)` from the selected bands.
    fn gather(&self, resolved: &ResolvedKey, bands: &[usize]) -> Result<Array3<T>> {
        let mut out = Array3::from_elem(
            (resolved.rows.len, resolved.cols.len, bands.len()),
            T::default(),
        );
        for (k, &b) in bands.iter().enumerate() {
            let block = self.bands[b].read_selection(&resolved.rows, &resolved.cols)?;
            out.index_axis_mut(Axis(2), k).assign(&block);
        }
        Ok(out)
    }

    fn get_index(&self, row: &IndexKind, col: &IndexKind, band: Option<&IndexKind>) -> Result<ArrayD<T>> {
        let resolved = ResolvedKey::from_parts(row, col, self.size()?)?;
        let bands = self.band_selection(band)?;
        trace!(
            rows = resolved.rows.len,
            cols = resolved.cols.len,
            bands = bands.len(),
            "indexer get"
        );

        let mut out = self.gather(&resolved, &bands)?.into_dyn();
        if band.is_some_and(IndexKind::collapses) {
            out = out.index_axis_move(Axis(2), 0);
        }
        if resolved.collapse_cols {
            out = out.index_axis_move(Axis(1), 0);
        }
        if resolved.collapse_rows {
            out = out.index_axis_move(Axis(0), 0);
        }
        Ok(out)
    }

    fn check_mask(&self, mask: &ArrayD<bool>) -> Result<(usize, usize)> {
        let (nrows, ncols) = self.size()?;
        let valid = match mask.ndim() {
            2 => mask.shape() == [nrows, ncols],
            3 => mask.shape() == [nrows, ncols, self.bands.len()],
            _ => false,
        };
        if valid {
            Ok((nrows, ncols))
        } else {
            Err(BandError::shape_mismatch(&[nrows, ncols, self.bands.len()], mask.shape()))
        }
    }

    fn get_mask(&self, mask: &ArrayD<bool>) -> Result<ArrayD<T>> {
        let size = self.check_mask(mask)?;
        let resolved = ResolvedKey::from_parts(&IndexKind::all(), &IndexKind::all(), size)?;
        let bands: Vec<usize> = (0..self.bands.len()).collect();
        let full = self.gather(&resolved, &bands)?;

        if mask.ndim() == 3 {
            let picked: Vec<T> = full
                .iter()
                .zip(mask.iter())
                .filter(|(_, m)| **m)
                .map(|(&v, _)| v)
                .collect();
            return Ok(ArrayD::from_shape_vec(vec![picked.len()], picked)?);
        }

        let mut picked = Vec::new();
        let mut count = 0;
        for ((r, c), &m) in band_mask(mask, 0)?.indexed_iter() {
            if m {
                picked.extend(full.slice(s![r, c, ..]).iter().copied());
                count += 1;
            }
        }
        Ok(ArrayD::from_shape_vec(vec![count, bands.len()], picked)?)
    }

    fn set_index(
        &mut self,
        row: &IndexKind,
        col: &IndexKind,
        band: Option<&IndexKind>,
        value: Value<T>,
    ) -> Result<()> {
        let resolved = ResolvedKey::from_parts(row, col, self.size()?)?;
        let bands = self.band_selection(band)?;
        let dest = resolved.dest();

        match &value {
            Value::Array(array) if array.ndim() == 3 => {
                if array.shape()[2] != bands.len() {
                    return Err(BandError::shape_mismatch(
                        &[dest.0, dest.1, bands.len()],
                        array.shape(),
                    ));
                }
                check_value_shape(&array.shape()[..2], dest, resolved.collapsed())?;
            }
            Value::Array(array) => check_value_shape(array.shape(), dest, resolved.collapsed())?,
            Value::Scalar(_) => {}
        }

        let key = BandKey::Cell(*row, *col);
        for (k, &b) in bands.iter().enumerate() {
            let per_band = match &value {
                Value::Array(array) if array.ndim() == 3 => {
                    Value::Array(array.index_axis(Axis(2), k).to_owned())
                }
                other => other.clone(),
            };
            self.bands[b].write(&key, per_band)?;
        }
        Ok(())
    }

    fn set_mask(&mut self, mask: &ArrayD<bool>, value: Value<T>) -> Result<()> {
        let (nrows, ncols) = self.check_mask(mask)?;
        let nbands = self.bands.len();

        if let Value::Array(array) = &value {
            match array.ndim() {
                3 if array.shape() == [nrows, ncols, nbands] => {}
                2 if array.shape() == [nrows, ncols] => {}
                1 => {
                    for b in 0..nbands {
                        let selected = band_mask(mask, b)?.iter().filter(|&&m| m).count();
                        if selected != array.len() {
                            return Err(BandError::shape_mismatch(&[selected], array.shape()));
                        }
                    }
                }
                _ => {
                    return Err(BandError::shape_mismatch(&[nrows, ncols], array.shape()));
                }
            }
        }

        for b in 0..nbands {
            let m = band_mask(mask, b)?;
            let mut tmp = self.bands[b].get_block(0, 0, nrows, ncols)?;
            overlay(&mut tmp, m, &value, b)?;
            self.bands[b].set_block(0, 0, tmp.view())?;
        }
        Ok(())
    }
}

/// The 2D mask that applies to `band`.
fn band_mask(mask: &ArrayD<bool>, band: usize) -> Result<ArrayView2<'_, bool>> {
    let view = if mask.ndim() == 3 {
        mask.index_axis(Axis(2), band)
    } else {
        mask.view()
    };
    Ok(view.into_dimensionality::<Ix2>()?)
}

/// Copy `value` into the cells of `tmp` where `mask` is set.
fn overlay<T: Element>(
    tmp: &mut Array2<T>,
    mask: ArrayView2<'_, bool>,
    value: &Value<T>,
    band: usize,
) -> Result<()> {
    match value {
        Value::Scalar(v) => {
            Zip::from(tmp).and(mask).for_each(|t, &m| {
                if m {
                    *t = *v;
                }
            });
        }
        Value::Array(array) if array.ndim() == 1 => {
            let mut values = array.iter();
            for (t, &m) in tmp.iter_mut().zip(mask.iter()) {
                if m {
                    if let Some(&v) = values.next() {
                        *t = v;
                    }
                }
            }
        }
        Value::Array(array) => {
            let source = if array.ndim() == 3 {
                array.index_axis(Axis(2), band)
            } else {
                array.view()
            };
            let source = source.into_dimensionality::<Ix2>()?;
            Zip::from(tmp).and(mask).and(source).for_each(|t, &m, &v| {
                if m {
                    *t = v;
                }
            });
        }
    }
    Ok(())
}

/// Row iterator returned by [`BandIndexer::rows`].
pub struct Rows<'i, 'a, T: Element> {
    indexer: &'i BandIndexer<'a, T>,
    row: usize,
    nrows: usize,
}

impl<T: Element> Iterator for Rows<'_, '_, T> {
    /// `(ncols,)` for one band, `(n_bands, ncols)` for several.
    type Item = Result<ArrayD<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row >= self.nrows {
            return None;
        }
        let key = BandKey::Cell(IndexKind::Single(self.row as isize), IndexKind::all());
        self.row += 1;

        let bands = &self.indexer.bands;
        if bands.len() == 1 {
            return Some(bands[0].read(&key));
        }
        let rows: Result<Vec<ArrayD<T>>> = bands.iter().map(|b| b.read(&key)).collect();
        Some(rows.and_then(|rows| {
            let views: Vec<_> = rows.iter().map(|r| r.view()).collect();
            Ok(stack(Axis(0), &views)?)
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.nrows - self.row;
        (remaining, Some(remaining))
    }
}

impl<T: Element> ExactSizeIterator for Rows<'_, '_, T> {}
