//! Configuration types for the scan pipeline.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nominal number of rows in one stacked block (6 pose rows + 179 LIDAR rows).
pub const DEFAULT_BLOCK_HEIGHT: usize = 185;

/// Maximum number of scan columns a block row can hold.
pub const DEFAULT_MAX_COLUMNS: usize = 100;

/// Rows 0..6 of every scan column carry pose data.
pub const POSE_ROWS: usize = 6;

/// Errors raised by invalid pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("block height must be at least {min} rows, got {got}")]
    InvalidBlockHeight { got: usize, min: usize },

    #[error("max columns must be positive")]
    InvalidMaxColumns,

    #[error("min valid width must be at least {min}, got {got}")]
    InvalidMinValidWidth { got: usize, min: usize },

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("unknown axis '{0}' (expected x, y or z)")]
    UnknownAxis(String),

    #[error("unknown lidar side '{0}' (expected left or right)")]
    UnknownSide(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Cartesian axis of a LIDAR point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl FromStr for Axis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(ConfigError::UnknownAxis(s.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Which of the two front LIDARs a point cloud came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LidarSide {
    #[default]
    Left,
    Right,
}

impl FromStr for LidarSide {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(LidarSide::Left),
            "right" => Ok(LidarSide::Right),
            _ => Err(ConfigError::UnknownSide(s.to_string())),
        }
    }
}

impl fmt::Display for LidarSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LidarSide::Left => "left",
            LidarSide::Right => "right",
        };
        f.write_str(name)
    }
}

/// Configuration for splitting the stacked table into blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Rows per block
    #[serde(default = "default_block_height")]
    pub block_height: usize,

    /// Separator rows skipped after each block (1 selects the 186-row framing)
    #[serde(default)]
    pub block_gap: usize,

    /// Columns per source row; shorter rows are padded with nulls
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,

    /// Narrowest valid width a block may have; never below 6
    #[serde(default = "default_min_valid_width")]
    pub min_valid_width: usize,
}

fn default_block_height() -> usize {
    DEFAULT_BLOCK_HEIGHT
}

fn default_max_columns() -> usize {
    DEFAULT_MAX_COLUMNS
}

fn default_min_valid_width() -> usize {
    POSE_ROWS
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            block_height: default_block_height(),
            block_gap: 0,
            max_columns: default_max_columns(),
            min_valid_width: default_min_valid_width(),
        }
    }
}

impl SegmentationConfig {
    /// Config with the given block height and defaults elsewhere.
    pub fn with_block_height(block_height: usize) -> Self {
        Self {
            block_height,
            ..Self::default()
        }
    }

    /// Distance in rows between the starts of two consecutive blocks.
    #[inline]
    pub fn block_stride(&self) -> usize {
        self.block_height + self.block_gap
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_height < POSE_ROWS {
            return Err(ConfigError::InvalidBlockHeight {
                got: self.block_height,
                min: POSE_ROWS,
            });
        }
        if self.max_columns == 0 {
            return Err(ConfigError::InvalidMaxColumns);
        }
        if self.min_valid_width < POSE_ROWS {
            return Err(ConfigError::InvalidMinValidWidth {
                got: self.min_valid_width,
                min: POSE_ROWS,
            });
        }
        Ok(())
    }
}

/// Closed rectangular crop bounds in the x/y plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Thresholds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// True if the point lies inside the bounds, edges included.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|b| b.is_nan()) {
            return Err(ConfigError::InvalidThresholds("bounds must not be NaN".into()));
        }
        if self.x_min > self.x_max {
            return Err(ConfigError::InvalidThresholds(format!(
                "x_min {} exceeds x_max {}",
                self.x_min, self.x_max
            )));
        }
        if self.y_min > self.y_max {
            return Err(ConfigError::InvalidThresholds(format!(
                "y_min {} exceeds y_max {}",
                self.y_min, self.y_max
            )));
        }
        Ok(())
    }
}

/// Parses `x_min,x_max,y_min,y_max`.
impl FromStr for Thresholds {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidThresholds(format!("'{}': {}", s, e)))?;

        match values.as_slice() {
            &[x_min, x_max, y_min, y_max] => {
                let thresholds = Thresholds::new(x_min, x_max, y_min, y_max);
                thresholds.validate()?;
                Ok(thresholds)
            }
            _ => Err(ConfigError::InvalidThresholds(format!(
                "expected 4 comma-separated values, got {}",
                values.len()
            ))),
        }
    }
}

/// Configuration for spectral analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpectralConfig {
    #[serde(default)]
    pub axis: Axis,

    #[serde(default)]
    pub side: LidarSide,

    /// Hand the magnitude spectrum to a plotting sink
    #[serde(default)]
    pub render: bool,
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Crop applied to every scan after construction
    #[serde(default)]
    pub thresholds: Option<Thresholds>,

    #[serde(default)]
    pub spectral: SpectralConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segmentation.validate()?;
        if let Some(thresholds) = &self.thresholds {
            thresholds.validate()?;
        }
        Ok(())
    }
}
