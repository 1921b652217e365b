//! Decoding of reshaped scan columns into [`Scan`] records.
//!
//! Column layout, top to bottom:
//!
//! | row   | content                                   |
//! |-------|-------------------------------------------|
//! | 0, 1  | GPS latitude, longitude                   |
//! | 2     | heading                                   |
//! | 3     | unidentified field, kept verbatim         |
//! | 4     | velocity                                  |
//! | 5     | `MM/DD/YYYY;HH:MM;AM` timestamp           |
//! | 6..   | `(lx;ly;lz;rx;ry;rz)` per angular sample  |

use chrono::NaiveDateTime;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::POSE_ROWS;
use crate::core::loaders::Cell;
use crate::core::scan::{PointCloud, Scan};
use super::reshape::ScanTable;

/// Timestamp layout once `;` separators are replaced by spaces.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M %p";

const ROW_LATITUDE: usize = 0;
const ROW_LONGITUDE: usize = 1;
const ROW_HEADING: usize = 2;
const ROW_RESERVED: usize = 3;
const ROW_VELOCITY: usize = 4;
const ROW_TIMESTAMP: usize = 5;

/// Values packed into one LIDAR cell: left xyz then right xyz.
const PACKED_VALUES: usize = 6;

/// Errors that can occur while decoding one scan column.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("column has {found} rows, at least {required} are required")]
    MissingRows { found: usize, required: usize },

    #[error("invalid {field} in row {row}: {value:?}")]
    InvalidField {
        field: &'static str,
        row: usize,
        value: Option<String>,
    },

    #[error("failed to parse timestamp {value:?}: {source}")]
    DateTimeParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed LIDAR cell in row {row} ({value:?}): {reason}")]
    PointDecode {
        row: usize,
        value: Option<String>,
        reason: String,
    },
}

/// Decode one scan column.
///
/// Any malformed cell fails the whole scan so that `left` and `right` stay
/// index-aligned.
pub fn build_scan(cells: &[Cell]) -> Result<Scan, ScanError> {
    if cells.len() < POSE_ROWS {
        return Err(ScanError::MissingRows {
            found: cells.len(),
            required: POSE_ROWS,
        });
    }

    let latitude = parse_float(cells, ROW_LATITUDE, "latitude")?;
    let longitude = parse_float(cells, ROW_LONGITUDE, "longitude")?;
    let heading = parse_float(cells, ROW_HEADING, "heading")?;
    let velocity = parse_float(cells, ROW_VELOCITY, "velocity")?;
    let timestamp = parse_timestamp(cells, ROW_TIMESTAMP)?;

    let lidar_rows = &cells[POSE_ROWS..];
    let mut left = PointCloud::with_capacity(lidar_rows.len());
    let mut right = PointCloud::with_capacity(lidar_rows.len());

    for (offset, cell) in lidar_rows.iter().enumerate() {
        let row = POSE_ROWS + offset;
        let value = cell.as_deref().ok_or_else(|| ScanError::PointDecode {
            row,
            value: None,
            reason: "cell is empty".to_string(),
        })?;
        let [lx, ly, lz, rx, ry, rz] = decode_packed_point(value).map_err(|reason| {
            ScanError::PointDecode {
                row,
                value: Some(value.to_string()),
                reason,
            }
        })?;
        left.push(lx, ly, lz);
        right.push(rx, ry, rz);
    }

    Ok(Scan {
        gps: (latitude, longitude),
        heading,
        reserved: cells[ROW_RESERVED].clone(),
        velocity,
        timestamp,
        left,
        right,
    })
}

/// Decode every column of `table`, one result per scan index.
///
/// Columns are decoded in parallel; the output order matches column order.
pub fn build_scans(table: &ScanTable) -> Vec<Result<Scan, ScanError>> {
    table
        .columns()
        .par_iter()
        .map(|column| build_scan(&column.cells))
        .collect()
}

fn parse_float(cells: &[Cell], row: usize, field: &'static str) -> Result<f64, ScanError> {
    let invalid = || ScanError::InvalidField {
        field,
        row,
        value: cells[row].clone(),
    };
    cells[row]
        .as_deref()
        .ok_or_else(invalid)?
        .parse::<f64>()
        .map_err(|_| invalid())
}

/// Parses a timestamp written as `03/14/2017;03:09;PM`.
pub fn parse_timestamp_str(raw: &str) -> Result<NaiveDateTime, ScanError> {
    let normalized = raw.replace(';', " ");
    NaiveDateTime::parse_from_str(normalized.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        ScanError::DateTimeParse {
            value: raw.to_string(),
            source,
        }
    })
}

fn parse_timestamp(cells: &[Cell], row: usize) -> Result<NaiveDateTime, ScanError> {
    let raw = cells[row].as_deref().ok_or(ScanError::InvalidField {
        field: "timestamp",
        row,
        value: None,
    })?;
    parse_timestamp_str(raw)
}

/// Splits `(a;b;c;d;e;f)` into its six values.
pub fn decode_packed_point(value: &str) -> Result<[f64; PACKED_VALUES], String> {
    let inner = value
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| "expected a parenthesised value".to_string())?;

    let tokens: Vec<&str> = inner.split(';').collect();
    if tokens.len() != PACKED_VALUES {
        return Err(format!(
            "expected {} values, found {}",
            PACKED_VALUES,
            tokens.len()
        ));
    }

    let mut values = [0.0; PACKED_VALUES];
    for (slot, token) in values.iter_mut().zip(&tokens) {
        *slot = token
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", token.trim()))?;
    }
    Ok(values)
}
