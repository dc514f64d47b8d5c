//! Integration tests for the multi-band indexer.
//!
//! Bands of both kinds are composed behind one `BandIndexer` and addressed
//! with parsed keys, explicit keys and boolean masks.

use std::sync::Arc;

use ndarray::{arr1, arr2, Array2, Array3, ArrayD, IxDyn};
use raster_band::{
    Band, BandError, BandIndexer, ChunkedBand, DenseBand, ElementType, FlateCompressor, IndexKind,
    Key, SliceSpec, Value,
};
use test_utils::keys;
use test_utils::layout;
use test_utils::{create_checkerboard_mask, create_corner_mask, create_sequential_grid};

fn chunked_f32(fill: f32) -> ChunkedBand<f32> {
    let l = layout::SCENARIO;
    ChunkedBand::new(l.size, l.chunk_size, fill, Arc::new(FlateCompressor::fast())).unwrap()
}

fn key(s: &str) -> Key {
    s.parse().unwrap()
}

// =============================================================================
// Mixed composition
// =============================================================================

#[test]
fn test_mixed_bands_full_read() {
    let mut elevation = chunked_f32(0.0);
    elevation
        .set_block(2, 2, Array2::from_elem((6, 6), 5.0).view())
        .unwrap();
    let mut slope = DenseBand::new((10, 10), Some(1.0f32));

    let indexer = BandIndexer::new(vec![&mut elevation as &mut dyn Band<f32>, &mut slope]).unwrap();
    assert_eq!(indexer.len(), 2);
    assert_eq!(indexer.shape().unwrap(), vec![2, 10, 10]);
    assert_eq!(indexer.element_type().unwrap(), ElementType::F32);

    let full = indexer.get(&key(keys::FULL)).unwrap();
    assert_eq!(full.shape(), &[10, 10, 2]);
    assert_eq!(full[IxDyn(&[3, 3, 0])], 5.0);
    assert_eq!(full[IxDyn(&[0, 0, 0])], 0.0);
    assert!(full.index_axis(ndarray::Axis(2), 1).iter().all(|&v| v == 1.0));

    let cell = indexer.get(&key(keys::CELL)).unwrap();
    assert_eq!(cell, arr1(&[5.0, 1.0]).into_dyn());

    let last = indexer.get(&key(keys::LAST_BAND_CELL)).unwrap();
    assert_eq!(last.shape(), &[] as &[usize]);
    assert_eq!(last.iter().next(), Some(&1.0));
}

#[test]
fn test_mismatched_band_sizes_rejected() {
    let mut a = DenseBand::new((4, 4), Some(0u8));
    let mut b = DenseBand::new((4, 5), Some(0u8));
    let result = BandIndexer::new(vec![&mut a as &mut dyn Band<u8>, &mut b]);
    assert!(matches!(result, Err(BandError::ShapeMismatch { .. })));
}

#[test]
fn test_empty_composition() {
    let indexer: BandIndexer<'_, f64> = BandIndexer::new(Vec::new()).unwrap();
    assert!(indexer.is_empty());
    assert_eq!(indexer.size(), Err(BandError::EmptyComposition));
    assert_eq!(indexer.get(&Key::all()), Err(BandError::EmptyComposition));
    assert_eq!(indexer.rows().count(), 0);
}

// =============================================================================
// Collapse rule
// =============================================================================

#[test]
fn test_collapse_order_band_column_row() {
    let mut a = DenseBand::from_array(create_sequential_grid::<i32>(4, 5));
    let mut b = DenseBand::from_array(create_sequential_grid::<i32>(4, 5) * 10);
    let indexer = BandIndexer::new(vec![&mut a as &mut dyn Band<i32>, &mut b]).unwrap();

    let shape = |k: Key| indexer.get(&k).unwrap().shape().to_vec();
    assert_eq!(shape(Key::all()), vec![4, 5, 2]);
    assert_eq!(shape(Key::index(1, 2)), vec![2]);
    assert_eq!(shape(Key::index(1, IndexKind::all())), vec![5, 2]);
    assert_eq!(shape(Key::index(IndexKind::all(), 2)), vec![4, 2]);
    assert_eq!(shape(Key::with_band(IndexKind::all(), 2, 1)), vec![4]);
    assert_eq!(shape(Key::with_band(1, IndexKind::all(), 0)), vec![5]);
    assert_eq!(shape(Key::with_band(1, 2, 1)), Vec::<usize>::new());
    assert_eq!(shape(Key::with_band(1, 2, SliceSpec::range(0, 1))), vec![1]);

    let column = indexer.get(&Key::with_band(IndexKind::all(), 2, 1)).unwrap();
    assert_eq!(column, arr1(&[20, 70, 120, 170]).into_dyn());
}

#[test]
fn test_strided_and_reversed_keys_across_bands() {
    let mut a = chunked_f32(0.0);
    a.set_block(0, 0, create_sequential_grid::<f32>(10, 10).view())
        .unwrap();
    let mut b = DenseBand::from_array(create_sequential_grid::<f32>(10, 10));
    let indexer = BandIndexer::new(vec![&mut a as &mut dyn Band<f32>, &mut b]).unwrap();

    let strided = indexer.get(&key(keys::STRIDED)).unwrap();
    assert_eq!(strided.shape(), &[5, 5, 2]);
    assert_eq!(strided[IxDyn(&[1, 1, 0])], 22.0);
    assert_eq!(strided[IxDyn(&[4, 4, 1])], 88.0);

    let reversed = indexer.get(&key(keys::REVERSED_ROWS)).unwrap();
    assert_eq!(reversed[IxDyn(&[0, 0, 0])], 90.0);
    assert_eq!(reversed[IxDyn(&[9, 3, 1])], 3.0);
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn test_scalar_write_through_index_key() {
    let mut a = chunked_f32(0.0);
    let mut b = DenseBand::new((10, 10), Some(0.0f32));
    {
        let mut indexer =
            BandIndexer::new(vec![&mut a as &mut dyn Band<f32>, &mut b]).unwrap();
        indexer.set(&key("2:4, 2:4"), Value::Scalar(3.0)).unwrap();
        indexer.set(&key("0, 0, 1"), Value::Scalar(-1.0)).unwrap();
    }

    assert_eq!(a.get_block(2, 2, 2, 2).unwrap(), Array2::from_elem((2, 2), 3.0f32));
    assert_eq!(b.get_block(2, 2, 2, 2).unwrap(), Array2::from_elem((2, 2), 3.0f32));
    assert_eq!(a.get_block(0, 0, 1, 1).unwrap()[[0, 0]], 0.0);
    assert_eq!(b.get_block(0, 0, 1, 1).unwrap()[[0, 0]], -1.0);
    assert_eq!(a.stats().set, 1);
}

#[test]
fn test_band_axis_value_split_per_band() {
    let mut a = DenseBand::new((3, 3), Some(0i32));
    let mut b = DenseBand::new((3, 3), Some(0i32));
    let mut c = DenseBand::new((3, 3), Some(0i32));
    {
        let mut indexer = BandIndexer::new(vec![
            &mut a as &mut dyn Band<i32>,
            &mut b,
            &mut c,
        ])
        .unwrap();
        // Bands 2 and 0, in that order.
        let value = Array3::from_shape_fn((3, 3, 2), |(_, _, k)| (k as i32 + 1) * 100);
        let reversed_pairs: IndexKind = "::-2".parse().unwrap();
        let key = Key::with_band(IndexKind::all(), IndexKind::all(), reversed_pairs);
        indexer.set(&key, value.into()).unwrap();
    }
    assert!(c.as_array().iter().all(|&v| v == 100));
    assert!(b.as_array().iter().all(|&v| v == 0));
    assert!(a.as_array().iter().all(|&v| v == 200));
}

#[test]
fn test_failed_shape_check_writes_no_band() {
    let mut a = DenseBand::new((3, 3), Some(0u16));
    let mut b = DenseBand::new((3, 3), Some(0u16));
    {
        let mut indexer = BandIndexer::new(vec![&mut a as &mut dyn Band<u16>, &mut b]).unwrap();
        let wrong = Array3::from_elem((3, 3, 3), 1u16);
        let result = indexer.set(&Key::all(), wrong.into());
        assert!(matches!(result, Err(BandError::ShapeMismatch { .. })));
    }
    assert!(a.as_array().iter().all(|&v| v == 0));
    assert!(b.as_array().iter().all(|&v| v == 0));
}

// =============================================================================
// Masks
// =============================================================================

#[test]
fn test_mask_corner_write_single_band() {
    let mut band = DenseBand::from_array(create_sequential_grid::<i64>(3, 3));
    {
        let mut indexer = BandIndexer::new(vec![&mut band as &mut dyn Band<i64>]).unwrap();
        let mask = Key::mask(create_corner_mask(3, 3));
        indexer.set(&mask, Value::Scalar(-9)).unwrap();

        let picked = indexer.get(&mask).unwrap();
        assert_eq!(picked.shape(), &[4, 1]);
        assert!(picked.iter().all(|&v| v == -9));
    }
    assert_eq!(
        band.into_array(),
        arr2(&[[-9, 1, -9], [3, 4, 5], [-9, 7, -9]])
    );
}

/// A mask write stores the full extent back, so every chunk ends up set
/// even though only the corner cells change.
#[test]
fn test_mask_write_on_chunked_band_materializes_full_extent() {
    let mut band = chunked_f32(0.0);
    {
        let mut indexer = BandIndexer::new(vec![&mut band as &mut dyn Band<f32>]).unwrap();
        indexer
            .set(&Key::mask(create_corner_mask(10, 10)), Value::Scalar(1.0))
            .unwrap();
    }
    let full = band.get_block(0, 0, 10, 10).unwrap();
    assert_eq!(full.iter().filter(|&&v| v == 1.0).count(), 4);
    assert_eq!(full[[9, 9]], 1.0);
    assert_eq!(full[[0, 9]], 1.0);
    assert_eq!(band.stats().set, 9);
}

#[test]
fn test_mask_read_with_band_axis() {
    let mut a = DenseBand::from_array(create_sequential_grid::<u8>(2, 2));
    let mut b = DenseBand::new((2, 2), Some(50u8));
    let indexer = BandIndexer::new(vec![&mut a as &mut dyn Band<u8>, &mut b]).unwrap();

    let mut mask = ArrayD::from_elem(IxDyn(&[2, 2, 2]), false);
    mask[IxDyn(&[0, 1, 0])] = true;
    mask[IxDyn(&[1, 1, 1])] = true;
    let picked = indexer.get(&Key::Mask(mask)).unwrap();
    assert_eq!(picked, arr1(&[1u8, 50]).into_dyn());

    let two_d = indexer.get(&Key::mask(create_checkerboard_mask(2, 2))).unwrap();
    assert_eq!(two_d, arr2(&[[0u8, 50], [3, 50]]).into_dyn());
}

#[test]
fn test_mask_values_in_order() {
    let mut band = DenseBand::new((2, 3), Some(0i32));
    {
        let mut indexer = BandIndexer::new(vec![&mut band as &mut dyn Band<i32>]).unwrap();
        let mask = Key::mask(create_checkerboard_mask(2, 3));
        indexer.set(&mask, arr1(&[1, 2, 3]).into()).unwrap();

        let short = indexer.set(&mask, arr1(&[1, 2]).into());
        assert!(matches!(short, Err(BandError::ShapeMismatch { .. })));
    }
    assert_eq!(band.into_array(), arr2(&[[1, 0, 2], [0, 3, 0]]));
}

#[test]
fn test_mask_of_wrong_shape_rejected() {
    let mut band = DenseBand::new((2, 2), Some(0i8));
    let indexer = BandIndexer::new(vec![&mut band as &mut dyn Band<i8>]).unwrap();
    let result = indexer.get(&Key::mask(create_corner_mask(3, 3)));
    assert!(matches!(result, Err(BandError::ShapeMismatch { .. })));
}

// =============================================================================
// Keys and iteration
// =============================================================================

#[test]
fn test_key_errors() {
    let mut band = DenseBand::new((3, 3), Some(0.0f64));
    let indexer = BandIndexer::new(vec![&mut band as &mut dyn Band<f64>]).unwrap();

    assert!(matches!(
        keys::TOO_MANY.parse::<Key>(),
        Err(BandError::UnsupportedKey(_))
    ));
    assert!(matches!("a, 1".parse::<Key>(), Err(BandError::UnsupportedKey(_))));
    assert!(matches!(
        indexer.get(&Key::index(3, 0)),
        Err(BandError::OutOfRange { .. })
    ));
    assert!(matches!(
        indexer.get(&Key::with_band(0, 0, 1)),
        Err(BandError::OutOfRange { .. })
    ));
    assert_eq!(indexer.get(&Key::index(-3, -3)).unwrap().shape(), &[1]);
}

#[test]
fn test_rows_iterator_is_restartable() {
    let mut a = DenseBand::from_array(create_sequential_grid::<i32>(3, 2));
    let mut b = DenseBand::new((3, 2), Some(7i32));
    let indexer = BandIndexer::new(vec![&mut a as &mut dyn Band<i32>, &mut b]).unwrap();

    let rows: Vec<ArrayD<i32>> = indexer.rows().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], arr2(&[[2, 3], [7, 7]]).into_dyn());
    assert_eq!(indexer.rows().len(), 3);
    assert_eq!(indexer.rows().next().unwrap().unwrap(), rows[0]);
}
