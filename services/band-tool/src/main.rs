//! Chunked band tool.
//!
//! Builds one or more chunked bands, writes rectangular regions into them,
//! optionally reads a key back through the multi-band indexer, and prints a
//! JSON report with per-band chunk statistics:
//! - Chunk shape and codec come from `BAND_*` environment variables,
//!   overridable on the command line
//! - Regions are written as constant blocks (`ROW,COL,ROWS,COLS=VALUE`)
//! - Keys use the textual form `"rows, cols[, bands]"`, e.g. `"::2, 3, 0"`

mod report;

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array2;
use raster_band::{
    Band, BandConfig, BandIndexer, ChunkCompression, ChunkedBand, Element, Key,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use report::{BandReport, ReadReport, Report};

#[derive(Parser, Debug)]
#[command(name = "band-tool")]
#[command(about = "Build chunked raster bands and read them through index keys")]
struct Args {
    /// Band height in rows
    #[arg(long, default_value = "1000")]
    rows: usize,

    /// Band width in columns
    #[arg(long, default_value = "1000")]
    cols: usize,

    /// Number of bands to compose
    #[arg(long, default_value = "1")]
    bands: usize,

    /// Value reported for cells that were never written
    #[arg(long, default_value = "0")]
    fill: f32,

    /// Chunk height (overrides BAND_CHUNK_ROWS)
    #[arg(long)]
    chunk_rows: Option<usize>,

    /// Chunk width (overrides BAND_CHUNK_COLS)
    #[arg(long)]
    chunk_cols: Option<usize>,

    /// Chunk codec: none, deflate or zlib (overrides BAND_COMPRESSION)
    #[arg(long)]
    compression: Option<String>,

    /// Region to write, as ROW,COL,ROWS,COLS=VALUE. Band b receives VALUE + b.
    #[arg(long = "write", value_name = "REGION")]
    writes: Vec<RegionWrite>,

    /// Key to read back through the indexer, e.g. "10:20, 5" or "0, 0, -1"
    #[arg(long)]
    key: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// A constant-valued rectangle given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RegionWrite {
    row_off: usize,
    col_off: usize,
    n_rows: usize,
    n_cols: usize,
    value: f32,
}

impl FromStr for RegionWrite {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (region, value) = s
            .split_once('=')
            .ok_or_else(|| format!("'{}' should look like ROW,COL,ROWS,COLS=VALUE", s))?;
        let parts: Vec<usize> = region
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| format!("invalid region '{}': {}", region, e))?;
        let &[row_off, col_off, n_rows, n_cols] = parts.as_slice() else {
            return Err(format!("region '{}' needs exactly 4 numbers", region));
        };
        let value = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid value '{}': {}", value, e))?;
        Ok(Self {
            row_off,
            col_off,
            n_rows,
            n_cols,
            value,
        })
    }
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    // Logs go to stderr so stdout carries only the report.
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = build_config(&args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid band configuration: {}", e))?;

    info!(
        rows = args.rows,
        cols = args.cols,
        bands = args.bands,
        chunk_rows = config.chunk_rows,
        chunk_cols = config.chunk_cols,
        codec = %config.compression,
        "Building bands"
    );

    let mut bands = Vec::with_capacity(args.bands);
    for b in 0..args.bands {
        let mut band = ChunkedBand::with_config((args.rows, args.cols), args.fill, &config)
            .with_context(|| format!("failed to create band {}", b))?;
        for write in &args.writes {
            let block = Array2::from_elem((write.n_rows, write.n_cols), write.value + b as f32);
            band.set_block(write.row_off, write.col_off, block.view())
                .with_context(|| format!("failed to write {:?} into band {}", write, b))?;
        }
        debug!(band = b, set = band.stats().set, "band written");
        bands.push(band);
    }

    let band_reports = bands
        .iter()
        .enumerate()
        .map(|(b, band)| BandReport::new(b, band))
        .collect();

    let read = match &args.key {
        Some(text) => {
            let key: Key = text
                .parse()
                .with_context(|| format!("failed to parse key '{}'", text))?;
            let views: Vec<&mut dyn Band<f32>> = bands
                .iter_mut()
                .map(|band| band as &mut dyn Band<f32>)
                .collect();
            let indexer = BandIndexer::new(views)?;
            let values = indexer
                .get(&key)
                .with_context(|| format!("failed to read key '{}'", text))?;
            info!(key = %text, shape = ?values.shape(), "Read key");
            Some(ReadReport::new(text, &values))
        }
        None => None,
    };

    let report = Report {
        size: (args.rows, args.cols),
        element_type: <f32 as Element>::TYPE,
        config,
        bands: band_reports,
        read,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn build_config(args: &Args) -> BandConfig {
    let mut config = BandConfig::from_env();
    if let Some(rows) = args.chunk_rows {
        config.chunk_rows = rows;
    }
    if let Some(cols) = args.chunk_cols {
        config.chunk_cols = cols;
    }
    if let Some(codec) = &args.compression {
        config.compression = ChunkCompression::from_str(codec);
    }
    config
}
