//! CSV writers for datasets, scans and spectra.
//!
//! - dataset summary: one row of vehicle state per scan
//! - scan point clouds: one row per point, tagged with its LIDAR side
//! - spectrum: frequency with the complex coefficient and its magnitude

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::scan::{Dataset, PointCloud, Scan};
use crate::config::LidarSide;
use crate::processors::spectral::Spectrum;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// CSV writer over a buffered file, remembering the path for error reports.
struct CsvOut {
    writer: csv::Writer<BufWriter<File>>,
    path: String,
}

impl CsvOut {
    fn create(path: &Path) -> Result<Self> {
        ensure_parent_dirs(path)?;
        let file = File::create(path).map_err(|e| WriteError::CreateFile {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            writer: csv::Writer::from_writer(BufWriter::new(file)),
            path: path.display().to_string(),
        })
    }

    fn record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|e| WriteError::CsvError {
                path: self.path.clone(),
                source: e,
            })
    }

    fn finish(mut self) -> Result<()> {
        self.writer.flush().map_err(|e| WriteError::WriteFile {
            path: self.path,
            source: e,
        })
    }
}

/// Write one row of vehicle state per scan.
///
/// Columns: `index,timestamp,latitude,longitude,heading,velocity,left_points,right_points`.
pub fn write_dataset_summary_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut out = CsvOut::create(path)?;
    out.record([
        "index",
        "timestamp",
        "latitude",
        "longitude",
        "heading",
        "velocity",
        "left_points",
        "right_points",
    ])?;

    for (index, scan) in dataset.iter() {
        out.record(&[
            index.to_string(),
            scan.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            scan.gps.0.to_string(),
            scan.gps.1.to_string(),
            scan.heading.to_string(),
            scan.velocity.to_string(),
            scan.left.len().to_string(),
            scan.right.len().to_string(),
        ])?;
    }

    out.finish()
}

fn write_cloud_rows(out: &mut CsvOut, side: LidarSide, cloud: &PointCloud) -> Result<()> {
    let side = side.to_string();
    for (i, p) in cloud.points().enumerate() {
        out.record(&[
            side.clone(),
            i.to_string(),
            format!("{:.6}", p.x),
            format!("{:.6}", p.y),
            format!("{:.6}", p.z),
        ])?;
    }
    Ok(())
}

/// Write both point clouds of `scan`.
///
/// Columns: `side,index,x,y,z`, left points first.
pub fn write_scan_csv(path: &Path, scan: &Scan) -> Result<()> {
    let mut out = CsvOut::create(path)?;
    out.record(["side", "index", "x", "y", "z"])?;
    write_cloud_rows(&mut out, LidarSide::Left, &scan.left)?;
    write_cloud_rows(&mut out, LidarSide::Right, &scan.right)?;
    out.finish()
}

/// Write a spectrum in FFT order.
///
/// Columns: `frequency,re,im,magnitude`.
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> Result<()> {
    let mut out = CsvOut::create(path)?;
    out.record(["frequency", "re", "im", "magnitude"])?;

    for (freq, coeff) in spectrum.frequencies.iter().zip(&spectrum.coefficients) {
        out.record(&[
            freq.to_string(),
            coeff.re.to_string(),
            coeff.im.to_string(),
            coeff.norm().to_string(),
        ])?;
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scan::tests::sample_scan;
    use crate::processors::spectral::spectrum_of;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_dataset_summary_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let dataset = Dataset::from_scans(vec![sample_scan(), sample_scan()]);

        write_dataset_summary_csv(&path, &dataset).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "index,timestamp,latitude,longitude,heading,velocity,left_points,right_points"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,2017-03-14T15:09:00,40.4237,-86.9212,271.5,12.25,3,3");
        assert!(lines[2].starts_with("1,"));
    }

    #[test]
    fn test_write_scan_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.csv");

        write_scan_csv(&path, &sample_scan()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "side,index,x,y,z");
        assert_eq!(lines.len(), 7); // header + 3 left + 3 right
        assert_eq!(lines[1], "left,0,1.000000,4.000000,0.100000");
        assert_eq!(lines[4], "right,0,-1.000000,7.000000,0.400000");
    }

    #[test]
    fn test_write_spectrum_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spectrum.csv");
        let spectrum = spectrum_of(&[1.0, 1.0, 1.0, 1.0]).unwrap();

        write_spectrum_csv(&path, &spectrum).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "frequency,re,im,magnitude");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("0,4,"));
        assert!(lines[1].ends_with(",4"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("scan.csv");

        write_scan_csv(&path, &sample_scan()).unwrap();

        assert!(path.exists());
    }
}
