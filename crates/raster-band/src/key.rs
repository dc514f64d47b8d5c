//! Index keys for bands and band indexers.
//!
//! Keys are parsed once into these types before any band is touched. A
//! component is either a single integer, which collapses its axis, or a
//! slice with Python `start:stop:step` semantics (negative steps allowed).

use std::str::FromStr;

use ndarray::{Array, ArrayD, Dimension};

use crate::error::{BandError, Result};

/// A `start:stop:step` slice; missing parts take their Python defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    /// The full axis, `:`.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// `start:stop`.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// Resolve against an axis of length `len`, like `slice.indices`.
    pub fn indices(&self, len: usize) -> Result<(isize, isize, isize)> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(BandError::unsupported_key("slice step cannot be zero"));
        }

        let len = len as isize;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: isize| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = match self.start {
            Some(s) => clamp(s),
            None if step < 0 => upper,
            None => lower,
        };
        let stop = match self.stop {
            Some(s) => clamp(s),
            None if step < 0 => lower,
            None => upper,
        };
        Ok((start, stop, step))
    }
}

impl std::fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let part = |v: Option<isize>| v.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", part(self.start), part(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for SliceSpec {
    type Err = BandError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(BandError::unsupported_key(format!("'{}' is not a slice", s)));
        }
        let parse = |p: &str| -> Result<Option<isize>> {
            if p.is_empty() {
                Ok(None)
            } else {
                p.parse().map(Some).map_err(|_| {
                    BandError::unsupported_key(format!("slice bound '{}' is not an integer", p))
                })
            }
        };
        Ok(Self {
            start: parse(parts[0])?,
            stop: parse(parts[1])?,
            step: match parts.get(2) {
                Some(p) => parse(p)?,
                None => None,
            },
        })
    }
}

/// One component of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// A single position; collapses its axis.
    Single(isize),
    /// A slice; keeps its axis.
    Range(SliceSpec),
}

impl IndexKind {
    /// `:`
    pub fn all() -> Self {
        Self::Range(SliceSpec::full())
    }

    pub fn collapses(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Resolve against an axis of length `len`.
    pub fn resolve(&self, len: usize, axis: &'static str) -> Result<Selection> {
        match self {
            Self::Single(i) => Selection::single(*i, len, axis),
            Self::Range(slice) => Selection::from_slice(slice, len),
        }
    }
}

impl From<isize> for IndexKind {
    fn from(i: isize) -> Self {
        Self::Single(i)
    }
}

impl From<i32> for IndexKind {
    fn from(i: i32) -> Self {
        Self::Single(i as isize)
    }
}

impl From<usize> for IndexKind {
    fn from(i: usize) -> Self {
        Self::Single(i as isize)
    }
}

impl From<SliceSpec> for IndexKind {
    fn from(s: SliceSpec) -> Self {
        Self::Range(s)
    }
}

impl FromStr for IndexKind {
    type Err = BandError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            return s.parse().map(Self::Range);
        }
        s.parse().map(Self::Single).map_err(|_| {
            BandError::unsupported_key(format!(
                "key component '{}' is neither an integer nor a slice",
                s
            ))
        })
    }
}

/// Positions selected along one axis: `start, start + step, ...`, `len` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub step: isize,
    pub len: usize,
}

impl Selection {
    /// Every position of an axis of length `len`.
    pub fn all(len: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            len,
        }
    }

    /// One position; negative values count from the end.
    pub fn single(i: isize, len: usize, axis: &'static str) -> Result<Self> {
        let n = len as isize;
        let pos = if i < 0 { i + n } else { i };
        if pos < 0 || pos >= n {
            return Err(BandError::out_of_range(axis, i, i.saturating_add(1), len));
        }
        Ok(Self {
            start: pos as usize,
            step: 1,
            len: 1,
        })
    }

    /// One position wrapped into the axis with `i mod len`.
    ///
    /// Legacy row addressing: -1 is the last row and `len` is row 0 again.
    pub fn wrapped(i: isize, len: usize, axis: &'static str) -> Result<Self> {
        if len == 0 {
            return Err(BandError::out_of_range(axis, i, i.saturating_add(1), len));
        }
        Ok(Self {
            start: i.rem_euclid(len as isize) as usize,
            step: 1,
            len: 1,
        })
    }

    pub fn from_slice(slice: &SliceSpec, len: usize) -> Result<Self> {
        let (start, stop, step) = slice.indices(len)?;
        // Both bounds lie in [-1, len], so the span cannot overflow; the step
        // magnitude is taken unsigned so `isize::MIN` is a valid stride.
        let span = if step > 0 { stop - start } else { start - stop };
        let count = if span > 0 {
            (span as usize - 1) / step.unsigned_abs() + 1
        } else {
            0
        };
        Ok(Self {
            start: if count > 0 { start as usize } else { 0 },
            step,
            len: count,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k`-th selected position.
    pub fn position(&self, k: usize) -> usize {
        (self.start as isize + k as isize * self.step) as usize
    }

    /// Smallest contiguous `(offset, extent)` covering every position.
    pub fn bounds(&self) -> (usize, usize) {
        if self.len == 0 {
            return (self.start, 0);
        }
        let last = self.position(self.len - 1);
        let off = self.start.min(last);
        (off, self.start.max(last) - off + 1)
    }

    /// Whether the positions are exactly the contiguous bounding range.
    pub fn is_contiguous(&self) -> bool {
        self.step == 1 || self.len <= 1
    }
}

/// Key for the per-band scalar/slice surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKey {
    /// One whole row, wrapped with `row mod nrows`.
    Row(isize),
    /// A slice of whole rows.
    Rows(SliceSpec),
    /// Row and column components.
    Cell(IndexKind, IndexKind),
}

impl BandKey {
    /// `[:, :]`
    pub fn all() -> Self {
        Self::Cell(IndexKind::all(), IndexKind::all())
    }
}

impl FromStr for BandKey {
    type Err = BandError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [one] => match one.parse()? {
                IndexKind::Single(i) => Ok(Self::Row(i)),
                IndexKind::Range(slice) => Ok(Self::Rows(slice)),
            },
            [row, col] => Ok(Self::Cell(row.parse()?, col.parse()?)),
            _ => Err(BandError::unsupported_key(
                "band can only be indexed along two dimensions",
            )),
        }
    }
}

/// Key for a [`crate::BandIndexer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Rows, columns and an optional band component (`None` selects all bands).
    Index {
        row: IndexKind,
        col: IndexKind,
        band: Option<IndexKind>,
    },
    /// Boolean mask over `(rows, cols)` or `(rows, cols, bands)`.
    Mask(ArrayD<bool>),
}

impl Key {
    pub fn index(row: impl Into<IndexKind>, col: impl Into<IndexKind>) -> Self {
        Self::Index {
            row: row.into(),
            col: col.into(),
            band: None,
        }
    }

    pub fn with_band(
        row: impl Into<IndexKind>,
        col: impl Into<IndexKind>,
        band: impl Into<IndexKind>,
    ) -> Self {
        Self::Index {
            row: row.into(),
            col: col.into(),
            band: Some(band.into()),
        }
    }

    /// `[:, :, :]`
    pub fn all() -> Self {
        Self::with_band(IndexKind::all(), IndexKind::all(), IndexKind::all())
    }

    pub fn mask<D: Dimension>(mask: Array<bool, D>) -> Self {
        Self::Mask(mask.into_dyn())
    }
}

impl FromStr for Key {
    type Err = BandError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [row, col] => Ok(Self::Index {
                row: row.parse()?,
                col: col.parse()?,
                band: None,
            }),
            [row, col, band] => Ok(Self::Index {
                row: row.parse()?,
                col: col.parse()?,
                band: Some(band.parse()?),
            }),
            _ => Err(BandError::unsupported_key(format!(
                "key should have 2 or 3 components, got {}",
                parts.len()
            ))),
        }
    }
}

/// A value written through a key: a scalar broadcast, or an array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Scalar(T),
    Array(ArrayD<T>),
}

impl<T, D: Dimension> From<Array<T, D>> for Value<T> {
    fn from(array: Array<T, D>) -> Self {
        Self::Array(array.into_dyn())
    }
}
