//! PNG rendering of spectra and scans.
//!
//! Plots are drawn with plotters onto a bitmap. No font backend is enabled,
//! so charts carry no axis labels.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::scan::{PointCloud, Scan};
use crate::processors::spectral::{SpectralError, Spectrum, SpectrumSink};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty point cloud")]
    EmptyPointCloud,

    #[error("Empty spectrum")]
    EmptySpectrum,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1280;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 720;

const LEFT_COLOR: RGBColor = RGBColor(55, 126, 184);
const RIGHT_COLOR: RGBColor = RGBColor(255, 127, 0);
const SPECTRUM_COLOR: RGBColor = RGBColor(228, 26, 28);

fn plotting_error<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Expands `min..max` by 5% on each side, or by 1 if it is degenerate.
fn padded_range(min: f64, max: f64) -> Range<f64> {
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.05;
    (min - padding)..(max + padding)
}

/// Plot the magnitude spectrum against frequency and save as PNG.
///
/// Points are drawn in ascending frequency order, so the negative half of
/// the FFT output appears to the left of DC.
pub fn plot_spectrum(output_path: &Path, spectrum: &Spectrum) -> Result<()> {
    if spectrum.is_empty() {
        return Err(VisualizationError::EmptySpectrum);
    }

    let mut points: Vec<(f64, f64)> = spectrum
        .frequencies
        .iter()
        .copied()
        .zip(spectrum.magnitudes())
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let f_min = points.first().map_or(0.0, |p| p.0);
    let f_max = points.last().map_or(0.0, |p| p.0);
    let m_max = points.iter().map(|p| p.1).fold(0.0, f64::max);

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(padded_range(f_min, f_max), padded_range(0.0, m_max))
        .map_err(plotting_error)?;

    chart
        .draw_series(LineSeries::new(points, SPECTRUM_COLOR.stroke_width(2)))
        .map_err(plotting_error)?;

    root.present().map_err(plotting_error)?;

    Ok(())
}

/// Plot an x/y scatter of both LIDAR clouds of a scan and save as PNG.
///
/// Left points are blue, right points orange.
pub fn plot_scan(output_path: &Path, scan: &Scan) -> Result<()> {
    if scan.left.is_empty() && scan.right.is_empty() {
        return Err(VisualizationError::EmptyPointCloud);
    }

    let (x_range, y_range) = compute_bounds(&[&scan.left, &scan.right]);

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plotting_error)?;

    for (cloud, color) in [(&scan.left, LEFT_COLOR), (&scan.right, RIGHT_COLOR)] {
        chart
            .draw_series(
                cloud
                    .points()
                    .map(|p| Circle::new((p.x, p.y), 2, color.filled())),
            )
            .map_err(plotting_error)?;
    }

    root.present().map_err(plotting_error)?;

    Ok(())
}

/// Padded x and y ranges covering every point of `clouds`.
fn compute_bounds(clouds: &[&PointCloud]) -> (Range<f64>, Range<f64>) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for p in clouds.iter().flat_map(|c| c.points()) {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }

    (padded_range(x_min, x_max), padded_range(y_min, y_max))
}

/// Renders every spectrum it receives to the same PNG file.
#[derive(Debug, Clone)]
pub struct PngSpectrumSink {
    path: PathBuf,
}

impl PngSpectrumSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SpectrumSink for PngSpectrumSink {
    fn render(&mut self, spectrum: &Spectrum) -> std::result::Result<(), SpectralError> {
        plot_spectrum(&self.path, spectrum).map_err(|e| SpectralError::Render(e.to_string()))
    }
}
