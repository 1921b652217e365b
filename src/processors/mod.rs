//! Data processing modules.

pub mod filtering;
pub mod reshape;
pub mod scan_builder;
pub mod segmentation;
pub mod spectral;

// Re-export key types for convenience
pub use filtering::{filter_cloud, retained_indices};
pub use reshape::{reshape_blocks, ScanColumn, ScanTable};
pub use scan_builder::{build_scan, build_scans, ScanError};
pub use segmentation::{
    clean_block, clean_blocks, segment_blocks, valid_width, Block, CleanBlock, SegmentationError,
};
pub use spectral::{
    analyze, analyze_scan, fft_frequencies, spectrum_of, Spectrum, SpectralError, SpectrumSink,
};
