//! Command-line interface for the scan pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::config::{Axis, LidarSide, PipelineConfig, Thresholds};
use crate::core::scan::{Dataset, Scan};
use crate::core::writers;
use crate::pipeline;
use crate::processors::spectral::{self, SpectrumSink};
use crate::visualization::{self, PngSpectrumSink};

#[derive(Parser)]
#[command(name = "lidar-scan-pipeline")]
#[command(about = "Reshape stacked dual-LIDAR logs into scans", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Rows per block (overrides config)
    #[arg(long, global = true)]
    block_height: Option<usize>,

    /// Separator rows after each block (overrides config)
    #[arg(long, global = true)]
    block_gap: Option<usize>,

    /// Crop bounds as x_min,x_max,y_min,y_max (overrides config)
    #[arg(long, global = true, allow_hyphen_values = true)]
    crop: Option<Thresholds>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dataset and report its size
    Summary {
        /// Input CSV log
        input: PathBuf,
        /// Write a per-scan summary CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the spectrum of one axis of one scan
    Fft {
        /// Input CSV log
        input: PathBuf,
        /// Scan index
        #[arg(short, long)]
        scan: usize,
        /// Coordinate axis (x, y or z)
        #[arg(long)]
        axis: Option<Axis>,
        /// LIDAR side (left or right)
        #[arg(long)]
        side: Option<LidarSide>,
        /// Render the magnitude spectrum to this PNG file
        #[arg(long)]
        render: Option<PathBuf>,
        /// Write the spectrum as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the point clouds of one scan as CSV
    Export {
        /// Input CSV log
        input: PathBuf,
        /// Scan index
        #[arg(short, long)]
        scan: usize,
        /// Output CSV file
        output: PathBuf,
    },

    /// Scatter plot the point clouds of one scan (PNG)
    Plot {
        /// Input CSV log
        input: PathBuf,
        /// Scan index
        #[arg(short, long)]
        scan: usize,
        /// Output PNG file
        output: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 37 {
            format!("{}...", value.chars().take(34).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<37} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = effective_config(&cli);

    let outcome = match &cli.command {
        Commands::Summary { input, output } => cmd_summary(input, output.as_deref(), &config),
        Commands::Fft {
            input,
            scan,
            axis,
            side,
            render,
            output,
        } => cmd_fft(
            input,
            *scan,
            *axis,
            *side,
            render.as_deref(),
            output.as_deref(),
            &config,
        ),
        Commands::Export {
            input,
            scan,
            output,
        } => cmd_export(input, *scan, output, &config),
        Commands::Plot {
            input,
            scan,
            output,
        } => cmd_plot(input, *scan, output, &config),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn effective_config(cli: &Cli) -> PipelineConfig {
    let mut config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    if let Some(height) = cli.block_height {
        config.segmentation.block_height = height;
    }
    if let Some(gap) = cli.block_gap {
        config.segmentation.block_gap = gap;
    }
    if cli.crop.is_some() {
        config.thresholds = cli.crop;
    }

    config
}

fn load_dataset(input: &Path, config: &PipelineConfig) -> Result<Dataset> {
    let spinner = create_spinner("Building scans...");
    let result = pipeline::process_file(input, config);
    spinner.finish_and_clear();
    result.with_context(|| format!("failed to build scans from {}", input.display()))
}

fn select_scan(dataset: &Dataset, index: usize) -> Result<&Scan> {
    dataset.get(index).with_context(|| {
        format!(
            "scan {} not found (dataset has {} scans)",
            index,
            dataset.len()
        )
    })
}

fn cmd_summary(input: &Path, output: Option<&Path>, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();
    let dataset = load_dataset(input, config)?;

    if let Some(path) = output {
        writers::write_dataset_summary_csv(path, &dataset)?;
    }

    let first = dataset.get(0).map(|s| s.timestamp.to_string()).unwrap_or_default();
    let last = dataset
        .iter()
        .last()
        .map(|(_, s)| s.timestamp.to_string())
        .unwrap_or_default();

    print_summary(
        "Scan Summary",
        &[
            ("Input file", input.display().to_string()),
            ("Scans", dataset.len().to_string()),
            ("First timestamp", first),
            ("Last timestamp", last),
            ("Block height", config.segmentation.block_height.to_string()),
            ("Cropped", config.thresholds.is_some().to_string()),
            (
                "Summary CSV",
                output.map_or("-".to_string(), |p| p.display().to_string()),
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_fft(
    input: &Path,
    scan_index: usize,
    axis: Option<Axis>,
    side: Option<LidarSide>,
    render: Option<&Path>,
    output: Option<&Path>,
    config: &PipelineConfig,
) -> Result<()> {
    let start = Instant::now();
    let dataset = load_dataset(input, config)?;
    let scan = select_scan(&dataset, scan_index)?;

    let mut spectral_config = config.spectral.clone();
    if let Some(axis) = axis {
        spectral_config.axis = axis;
    }
    if let Some(side) = side {
        spectral_config.side = side;
    }
    spectral_config.render |= render.is_some();

    let png_path = render.map(Path::to_path_buf).unwrap_or_else(|| {
        input.with_file_name(format!(
            "scan_{}_{}_{}_fft.png",
            scan_index, spectral_config.side, spectral_config.axis
        ))
    });
    let mut sink = PngSpectrumSink::new(png_path);
    let spectrum = spectral::analyze_scan(
        scan,
        &spectral_config,
        Some(&mut sink as &mut dyn SpectrumSink),
    )?;

    if let Some(path) = output {
        writers::write_spectrum_csv(path, &spectrum)?;
    }

    let dominant = spectrum
        .dominant_frequency()
        .map_or("-".to_string(), |(f, m)| format!("{:.4} (|X| = {:.3})", f, m));

    print_summary(
        "Spectrum Complete",
        &[
            ("Scan", scan_index.to_string()),
            ("Side", spectral_config.side.to_string()),
            ("Axis", spectral_config.axis.to_string()),
            ("Samples", spectrum.len().to_string()),
            ("Dominant frequency", dominant),
            (
                "Rendered PNG",
                if spectral_config.render {
                    sink.path().display().to_string()
                } else {
                    "-".to_string()
                },
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_export(input: &Path, scan_index: usize, output: &Path, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();
    let dataset = load_dataset(input, config)?;
    let scan = select_scan(&dataset, scan_index)?;

    writers::write_scan_csv(output, scan)?;

    print_summary(
        "Export Complete",
        &[
            ("Scan", scan_index.to_string()),
            ("Left points", scan.left.len().to_string()),
            ("Right points", scan.right.len().to_string()),
            ("Output CSV", output.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_plot(input: &Path, scan_index: usize, output: &Path, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();
    let dataset = load_dataset(input, config)?;
    let scan = select_scan(&dataset, scan_index)?;

    visualization::plot_scan(output, scan)?;

    print_summary(
        "Plot Complete",
        &[
            ("Scan", scan_index.to_string()),
            ("Output PNG", output.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::stacked_csv;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "lidar-scan-pipeline",
            "--block-height",
            "186",
            "--crop",
            "-1,1,-2,2",
            "summary",
            "log.csv",
        ])
        .unwrap();

        let config = effective_config(&cli);
        assert_eq!(config.segmentation.block_height, 186);
        assert_eq!(config.thresholds, Some(Thresholds::new(-1.0, 1.0, -2.0, 2.0)));
    }

    #[test]
    fn test_fft_args_parse() {
        let cli = Cli::try_parse_from([
            "lidar-scan-pipeline",
            "fft",
            "log.csv",
            "--scan",
            "3",
            "--axis",
            "Y",
            "--side",
            "right",
        ])
        .unwrap();

        match cli.command {
            Commands::Fft {
                scan, axis, side, ..
            } => {
                assert_eq!(scan, 3);
                assert_eq!(axis, Some(Axis::Y));
                assert_eq!(side, Some(LidarSide::Right));
            }
            _ => panic!("Expected fft command"),
        }
    }

    #[test]
    fn test_export_and_fft_commands() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("log.csv");
        fs::write(&input, stacked_csv(10, &[6, 7], 100)).unwrap();

        let config = PipelineConfig {
            segmentation: crate::config::SegmentationConfig::with_block_height(10),
            ..PipelineConfig::default()
        };

        let export = dir.path().join("scan.csv");
        cmd_export(&input, 12, &export, &config).unwrap();
        let lines = fs::read_to_string(&export).unwrap().lines().count();
        assert_eq!(lines, 1 + 2 * 4);

        let spectrum_csv = dir.path().join("fft.csv");
        let png = dir.path().join("fft.png");
        cmd_fft(&input, 0, Some(Axis::X), None, Some(&png), Some(&spectrum_csv), &config).unwrap();
        assert!(png.exists());
        assert!(spectrum_csv.exists());

        assert!(cmd_export(&input, 13, &export, &config).is_err());
    }

    #[test]
    fn test_summary_and_plot_commands() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("log.csv");
        fs::write(&input, stacked_csv(9, &[6, 8], 100)).unwrap();

        let config = PipelineConfig {
            segmentation: crate::config::SegmentationConfig::with_block_height(9),
            ..PipelineConfig::default()
        };

        let summary = dir.path().join("out").join("summary.csv");
        cmd_summary(&input, Some(&summary), &config).unwrap();
        let content = fs::read_to_string(&summary).unwrap();
        // header + one row per scan
        assert_eq!(content.lines().count(), 1 + 14);
        assert!(content.lines().nth(14).unwrap().starts_with("13,"));

        let png = dir.path().join("scan.png");
        cmd_plot(&input, 5, &png, &config).unwrap();
        assert!(png.exists());

        assert!(cmd_plot(&input, 14, &dir.path().join("missing.png"), &config).is_err());
        assert!(cmd_summary(&dir.path().join("absent.csv"), None, &config).is_err());
    }
}
