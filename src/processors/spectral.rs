//! Discrete Fourier analysis of one point-cloud coordinate.
//!
//! The coordinate values are treated as a signal sampled once per angular
//! step (unit sample spacing), so frequencies are in cycles per sample.

use log::debug;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use thiserror::Error;

use crate::config::{Axis, SpectralConfig};
use crate::core::scan::{PointCloud, Scan};

/// Errors that can occur during spectral analysis.
#[derive(Debug, Error)]
pub enum SpectralError {
    #[error("cannot compute the spectrum of an empty sequence")]
    EmptySequence,

    #[error("failed to render spectrum: {0}")]
    Render(String),
}

/// Sample frequencies and DFT coefficients of one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Standard FFT ordering: 0, positive frequencies, then negative ones.
    pub frequencies: Vec<f64>,
    pub coefficients: Vec<Complex64>,
}

impl Spectrum {
    #[inline]
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// |X_k| for every coefficient.
    pub fn magnitudes(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.norm()).collect()
    }

    /// Positive frequency with the largest magnitude, DC excluded.
    pub fn dominant_frequency(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.coefficients)
            .filter(|(f, _)| **f > 0.0)
            .map(|(&f, c)| (f, c.norm()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Receives spectra for display when rendering is requested.
pub trait SpectrumSink {
    fn render(&mut self, spectrum: &Spectrum) -> Result<(), SpectralError>;
}

/// Sample frequencies for an `n`-point DFT with unit spacing.
///
/// Indices `0..=(n-1)/2` map to `i/n`; the rest map to `(i-n)/n`.
pub fn fft_frequencies(n: usize) -> Vec<f64> {
    let positive = (n + 1) / 2;
    let nf = n as f64;
    (0..n)
        .map(|i| {
            if i < positive {
                i as f64 / nf
            } else {
                (i as f64 - nf) / nf
            }
        })
        .collect()
}

/// Forward DFT of a real signal.
pub fn spectrum_of(signal: &[f64]) -> Result<Spectrum, SpectralError> {
    if signal.is_empty() {
        return Err(SpectralError::EmptySequence);
    }

    let n = signal.len();
    let mut buffer: Vec<Complex64> = signal.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    debug!("Computed {}-point DFT", n);

    Ok(Spectrum {
        frequencies: fft_frequencies(n),
        coefficients: buffer,
    })
}

/// Spectrum of one coordinate of `cloud`, taken in sample order.
pub fn analyze(cloud: &PointCloud, axis: Axis) -> Result<Spectrum, SpectralError> {
    spectrum_of(cloud.axis(axis))
}

/// Spectrum of the configured side and axis of `scan`.
///
/// When `config.render` is set and a sink is given, the spectrum is handed
/// to the sink before being returned.
pub fn analyze_scan(
    scan: &Scan,
    config: &SpectralConfig,
    sink: Option<&mut dyn SpectrumSink>,
) -> Result<Spectrum, SpectralError> {
    let spectrum = analyze(scan.cloud(config.side), config.axis)?;

    if config.render {
        if let Some(sink) = sink {
            sink.render(&spectrum)?;
        }
    }

    Ok(spectrum)
}
