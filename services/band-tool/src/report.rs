//! JSON report printed after a run.

use ndarray::ArrayD;
use raster_band::{BandConfig, ChunkState, ChunkStats, ChunkedBand, ElementType};
use serde::Serialize;

/// Storage summary for one band.
#[derive(Debug, Serialize)]
pub struct BandReport {
    pub band: usize,
    #[serde(flatten)]
    pub stats: ChunkStats,
    pub compression_ratio: f64,
    /// Row-major chunk map: `#` for set chunks, `.` for unset ones.
    pub chunk_map: Vec<String>,
}

impl BandReport {
    pub fn new(band: usize, source: &ChunkedBand<f32>) -> Self {
        let stats = source.stats();
        let states = source.chunk_states();
        let chunk_map = states
            .chunks(source.nchunkcols().max(1))
            .map(|row| {
                row.iter()
                    .map(|s| match s {
                        ChunkState::Set => '#',
                        ChunkState::Unset => '.',
                    })
                    .collect()
            })
            .collect();
        Self {
            band,
            compression_ratio: stats.compression_ratio(),
            stats,
            chunk_map,
        }
    }
}

/// Values read through a key.
#[derive(Debug, Serialize)]
pub struct ReadReport {
    pub key: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl ReadReport {
    pub fn new(key: &str, values: &ArrayD<f32>) -> Self {
        Self {
            key: key.to_string(),
            shape: values.shape().to_vec(),
            values: values.iter().copied().collect(),
        }
    }
}

/// Everything the tool prints.
#[derive(Debug, Serialize)]
pub struct Report {
    pub size: (usize, usize),
    pub element_type: ElementType,
    pub config: BandConfig,
    pub bands: Vec<BandReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<ReadReport>,
}
