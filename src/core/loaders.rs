//! Loader for the headerless, stacked scan log.
//!
//! The log is a comma-separated grid of up to `max_columns` cells per row.
//! Rows are ragged; missing trailing cells are padded with the null marker
//! (`None`) so every row of a [`RawTable`] has the same width.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;
use thiserror::Error;

/// One source cell. `None` is the null marker.
pub type Cell = Option<String>;

/// Tokens read as nulls, matching the usual spreadsheet/pandas exports.
const NULL_TOKENS: &[&str] = &["nan", "NaN", "NAN", "NA", "N/A", "null", "NULL"];

/// Errors that can occur during table loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Row {row} has {found} columns, more than the maximum of {max}")]
    TooManyColumns { row: usize, found: usize, max: usize },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Rectangular grid of raw cells, right-padded with nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawTable {
    /// Builds a table from ragged rows, padding each to `width` with nulls.
    ///
    /// Rows longer than `width` are rejected.
    pub fn from_rows(rows: Vec<Vec<Cell>>, width: usize) -> Result<Self> {
        let mut padded = Vec::with_capacity(rows.len());
        for (row_idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(LoaderError::TooManyColumns {
                    row: row_idx,
                    found: row.len(),
                    max: width,
                });
            }
            row.resize(width, None);
            padded.push(row);
        }
        Ok(Self {
            rows: padded,
            width,
        })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// Normalizes a raw CSV field into a cell.
pub fn parse_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() || NULL_TOKENS.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Read a stacked scan table from any byte source.
///
/// The source has no header row; rows may have fewer than `max_columns`
/// fields and are padded with nulls.
pub fn read_table<R: Read>(reader: R, max_columns: usize) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    let table = RawTable::from_rows(rows, max_columns)?;
    debug!(
        "Read table with {} rows x {} columns",
        table.num_rows(),
        table.width()
    );
    Ok(table)
}

/// Load a stacked scan table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is empty, or has a row
/// wider than `max_columns`.
pub fn load_table<P: AsRef<Path>>(path: P, max_columns: usize) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_table(BufReader::new(file), max_columns)?;

    if table.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_cell_null_markers() {
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("  "), None);
        assert_eq!(parse_cell("NaN"), None);
        assert_eq!(parse_cell("nan"), None);
        assert_eq!(parse_cell(" 1.5 "), Some("1.5".to_string()));
        assert_eq!(
            parse_cell("(1;2;3;4;5;6)"),
            Some("(1;2;3;4;5;6)".to_string())
        );
    }

    #[test]
    fn test_read_table_pads_ragged_rows() -> Result<()> {
        let data = "1,2,3\n4,5\n6\n";
        let table = read_table(data.as_bytes(), 4)?;

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.width(), 4);
        assert_eq!(table.cell(0, 2), Some("3"));
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.cell(2, 0), Some("6"));
        assert_eq!(table.cell(2, 3), None);
        Ok(())
    }

    #[test]
    fn test_read_table_keeps_packed_and_datetime_cells() -> Result<()> {
        let data = "03/14/2017;03:09;PM,(1.5;2;3;-4;5;6.25)\n";
        let table = read_table(data.as_bytes(), 2)?;

        assert_eq!(table.cell(0, 0), Some("03/14/2017;03:09;PM"));
        assert_eq!(table.cell(0, 1), Some("(1.5;2;3;-4;5;6.25)"));
        Ok(())
    }

    #[test]
    fn test_read_table_rejects_wide_rows() {
        let data = "1,2,3\n";
        let result = read_table(data.as_bytes(), 2);
        assert!(matches!(
            result,
            Err(LoaderError::TooManyColumns {
                row: 0,
                found: 3,
                max: 2
            })
        ));
    }

    #[test]
    fn test_load_table_from_file() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1.0,2.0,,").unwrap();
        writeln!(file, "3.0,4.0,5.0,6.0").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path(), 100)?;
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.width(), 100);
        assert_eq!(table.cell(0, 1), Some("2.0"));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 3), Some("6.0"));
        Ok(())
    }

    #[test]
    fn test_load_table_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let result = load_table(file.path(), 100);
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }
}
