//! Reshaping of stacked dual-LIDAR vehicle logs into structured scans.
//!
//! This crate provides tools for:
//! - Loading the headerless, block-stacked CSV log into a raw cell table
//! - Segmenting it into fixed-height blocks and trimming ragged rows
//! - Decoding each column into a [`Scan`] with vehicle pose and two point clouds
//! - Cropping point clouds to an x/y window (parallelized)
//! - Spectral analysis of one coordinate of a point cloud
//!
//! # Example
//!
//! ```no_run
//! use lidar_scan_pipeline::{process_file, Axis, PipelineConfig};
//! use lidar_scan_pipeline::processors::spectral::analyze;
//!
//! let dataset = process_file("log.csv", &PipelineConfig::default()).unwrap();
//! let scan = dataset.get(0).unwrap();
//! let spectrum = analyze(&scan.left, Axis::X).unwrap();
//! println!("{} -> {:?}", scan, spectrum.dominant_frequency());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod processors;
pub mod visualization;

pub use config::{Axis, LidarSide, PipelineConfig, SegmentationConfig, SpectralConfig, Thresholds};
pub use crate::core::scan::{Dataset, PointCloud, Scan};
pub use pipeline::{process_file, process_reader, PipelineError};
pub use processors::spectral::Spectrum;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
