//! End-to-end construction of a [`Dataset`] from a stacked scan log.
//!
//! ```text
//!  raw table ──► segment_blocks ──► clean_blocks ──► reshape_blocks
//!                                                        │
//!            Dataset ◄── (optional crop) ◄── build_scans ◄┘
//! ```

use std::fmt;
use std::io::Read;
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig, SegmentationConfig};
use crate::core::loaders::{self, LoaderError, RawTable};
use crate::core::scan::{Dataset, Scan};
use crate::processors::reshape::{reshape_blocks, ScanTable};
use crate::processors::scan_builder::{build_scans, ScanError};
use crate::processors::segmentation::{clean_blocks, segment_blocks, SegmentationError};

/// Every scan that failed to decode, with its scan index.
#[derive(Debug)]
pub struct ScanFailures(pub Vec<(usize, ScanError)>);

impl ScanFailures {
    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().map(|(i, _)| *i).collect()
    }
}

impl fmt::Display for ScanFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} scan(s) failed to decode", self.0.len())?;
        for (index, err) in &self.0 {
            write!(f, "; scan {}: {}", index, err)?;
        }
        Ok(())
    }
}

/// Errors that can occur while building a dataset.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error("{0}")]
    Scans(ScanFailures),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Segment, clean and reshape `table` into one column per scan.
pub fn reshape_table(table: &RawTable, config: &SegmentationConfig) -> Result<ScanTable> {
    let blocks = segment_blocks(table, config)?;
    let clean = clean_blocks(&blocks, config.min_valid_width)?;
    Ok(reshape_blocks(&clean))
}

/// Decode every scan of `table`.
///
/// All columns are attempted. If any fail, the build fails and lists every
/// failing scan index; no partially decoded scan is returned.
pub fn build_dataset(table: &RawTable, config: &SegmentationConfig) -> Result<Dataset> {
    let reshaped = reshape_table(table, config)?;

    let mut scans: Vec<Scan> = Vec::with_capacity(reshaped.num_columns());
    let mut failures = Vec::new();
    for (index, result) in build_scans(&reshaped).into_iter().enumerate() {
        match result {
            Ok(scan) => scans.push(scan),
            Err(err) => failures.push((index, err)),
        }
    }

    if !failures.is_empty() {
        return Err(PipelineError::Scans(ScanFailures(failures)));
    }

    Ok(Dataset::from_scans(scans))
}

/// Build a dataset from `table` and apply the configured crop, if any.
pub fn process_table(table: &RawTable, config: &PipelineConfig) -> Result<Dataset> {
    config.validate()?;

    let mut dataset = build_dataset(table, &config.segmentation)?;
    info!("Built dataset with {} scans", dataset.len());

    if let Some(thresholds) = &config.thresholds {
        dataset.crop(thresholds);
        info!(
            "Cropped scans to x [{}, {}], y [{}, {}]",
            thresholds.x_min, thresholds.x_max, thresholds.y_min, thresholds.y_max
        );
    }

    Ok(dataset)
}

/// Build a dataset from any byte source holding the CSV log.
pub fn process_reader<R: Read>(reader: R, config: &PipelineConfig) -> Result<Dataset> {
    let table = loaders::read_table(reader, config.segmentation.max_columns)?;
    process_table(&table, config)
}

/// Build a dataset from a CSV log on disk.
pub fn process_file<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let table = loaders::load_table(path, config.segmentation.max_columns)?;
    info!(
        "Loaded {} rows from {}",
        table.num_rows(),
        path.display()
    );
    process_table(&table, config)
}
