//! Grid and mask generators for band tests.
//!
//! These functions create predictable arrays so tests can tell exactly which
//! cell a value came from after it has passed through chunking, compression
//! and strided indexing.

use ndarray::Array2;
use num_traits::NumCast;

/// Creates a grid where each value encodes its position.
///
/// Value at (row, col) is `col * 1000 + row`, making it easy to verify
/// that reads return cells from the right place.
///
/// Values that do not fit in `T` (for example in a large `u8` grid) fall back
/// to `T::default()`.
///
/// # Arguments
///
/// * `rows` - Number of rows
/// * `cols` - Number of columns
pub fn create_test_grid<T>(rows: usize, cols: usize) -> Array2<T>
where
    T: NumCast + Default,
{
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        T::from(col * 1000 + row).unwrap_or_default()
    })
}

/// Creates a grid numbered in row-major order: `row * cols + col`.
///
/// Handy when expected slices are easier to write as consecutive numbers.
pub fn create_sequential_grid<T>(rows: usize, cols: usize) -> Array2<T>
where
    T: NumCast + Default,
{
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        T::from(row * cols + col).unwrap_or_default()
    })
}

/// Creates a grid filled with a constant value.
///
/// Useful for testing edge cases and simple scenarios.
pub fn create_constant_grid<T: Clone>(rows: usize, cols: usize, value: T) -> Array2<T> {
    Array2::from_elem((rows, cols), value)
}

/// Creates a deterministic sparse grid.
///
/// Roughly one cell in four holds a value in `0.0..50.0`; the rest are zero.
/// This compresses well and resembles the mostly-empty bands chunked storage
/// is meant for.
///
/// # Arguments
///
/// * `rows` - Number of rows
/// * `cols` - Number of columns
/// * `seed` - Seed value for deterministic generation
pub fn create_sparse_grid(rows: usize, cols: usize, seed: u32) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let hash = simple_hash(col as u32, row as u32, seed);
        if hash % 4 == 0 {
            (hash % 5000) as f32 / 100.0
        } else {
            0.0
        }
    })
}

/// Creates a deterministic pseudo-random grid with no structure at all.
///
/// Use it where compression must not hide bugs (every cell differs).
pub fn create_noise_grid(rows: usize, cols: usize, seed: u32) -> Array2<u32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        simple_hash(col as u32, row as u32, seed)
    })
}

/// Creates a mask that selects only the four corner cells.
pub fn create_corner_mask(rows: usize, cols: usize) -> Array2<bool> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        (row == 0 || row + 1 == rows) && (col == 0 || col + 1 == cols)
    })
}

/// Creates a checkerboard mask; cell (0, 0) is selected.
pub fn create_checkerboard_mask(rows: usize, cols: usize) -> Array2<bool> {
    Array2::from_shape_fn((rows, cols), |(row, col)| (row + col) % 2 == 0)
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid: Array2<f32> = create_test_grid(5, 10);
        assert_eq!(grid.dim(), (5, 10));
        assert_eq!(grid[[0, 0]], 0.0); // col=0, row=0
        assert_eq!(grid[[0, 1]], 1000.0); // col=1, row=0
        assert_eq!(grid[[1, 0]], 1.0); // col=0, row=1
        assert_eq!(grid[[1, 1]], 1001.0); // col=1, row=1
    }

    #[test]
    fn test_create_test_grid_overflow_falls_back_to_default() {
        let grid: Array2<u8> = create_test_grid(3, 3);
        assert_eq!(grid[[2, 0]], 2);
        assert_eq!(grid[[0, 1]], 0);
    }

    #[test]
    fn test_create_sequential_grid() {
        let grid: Array2<i32> = create_sequential_grid(3, 4);
        assert_eq!(grid[[0, 3]], 3);
        assert_eq!(grid[[1, 0]], 4);
        assert_eq!(grid[[2, 3]], 11);
    }

    #[test]
    fn test_create_constant_grid() {
        let grid = create_constant_grid(10, 10, 42.0f64);
        assert_eq!(grid.len(), 100);
        assert!(grid.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_sparse_grid_deterministic() {
        let grid1 = create_sparse_grid(100, 100, 42);
        let grid2 = create_sparse_grid(100, 100, 42);
        assert_eq!(grid1, grid2, "Same seed should produce same data");

        let grid3 = create_sparse_grid(100, 100, 43);
        assert_ne!(grid1, grid3, "Different seed should produce different data");

        let zeros = grid1.iter().filter(|&&v| v == 0.0).count();
        assert!(zeros > grid1.len() / 2, "grid should be mostly empty");
    }

    #[test]
    fn test_corner_mask() {
        let mask = create_corner_mask(3, 3);
        let selected: Vec<(usize, usize)> = mask
            .indexed_iter()
            .filter(|(_, m)| **m)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(selected, vec![(0, 0), (0, 2), (2, 0), (2, 2)]);
    }

    #[test]
    fn test_checkerboard_mask() {
        let mask = create_checkerboard_mask(4, 4);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 8);
        assert!(mask[[0, 0]]);
        assert!(!mask[[0, 1]]);
    }
}
