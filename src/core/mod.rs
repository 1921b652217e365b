//! Core data types and I/O operations.

pub mod loaders;
pub mod scan;
pub mod writers;

pub use loaders::{load_table, read_table, Cell, LoaderError, RawTable};
pub use scan::{Dataset, Point3, PointCloud, Scan};
pub use writers::{write_dataset_summary_csv, write_scan_csv, write_spectrum_csv, WriteError};
