//! Block segmentation and ragged-width cleaning.
//!
//! The log is a vertical stack of fixed-height blocks. Each block holds up to
//! `max_columns` scans side by side, one scan per column. Blocks that were not
//! full are right-padded with nulls, so the populated width has to be
//! recovered before the blocks can be joined.

use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::{ConfigError, SegmentationConfig};
use crate::core::loaders::{Cell, RawTable};

/// Errors that can occur while splitting or cleaning blocks.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("block {block} has valid width {valid_width}, at least {required} columns are required")]
    MalformedBlock {
        block: usize,
        valid_width: usize,
        required: usize,
    },
}

/// Borrowed view of one block of the raw table.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub index: usize,
    pub rows: Range<usize>,
    pub cells: &'a [Vec<Cell>],
}

impl Block<'_> {
    #[inline]
    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn first_row(&self) -> &[Cell] {
        self.cells.first().map(|row| row.as_slice()).unwrap_or(&[])
    }
}

/// A block truncated to its populated columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanBlock {
    pub index: usize,
    /// Row range in the source table
    pub rows: Range<usize>,
    pub valid_width: usize,
    /// `height` rows of exactly `valid_width` cells
    pub cells: Vec<Vec<Cell>>,
}

impl CleanBlock {
    #[inline]
    pub fn height(&self) -> usize {
        self.cells.len()
    }
}

/// Split `table` into consecutive, non-overlapping blocks.
///
/// Block `i` starts at row `i * (block_height + block_gap)`. A trailing run of
/// rows too short to fill a block is dropped.
pub fn segment_blocks<'a>(
    table: &'a RawTable,
    config: &SegmentationConfig,
) -> Result<Vec<Block<'a>>, SegmentationError> {
    config.validate()?;

    let height = config.block_height;
    let stride = config.block_stride();
    let total = table.num_rows();

    let blocks: Vec<Block<'a>> = (0..)
        .map(|i| i * stride)
        .take_while(|&start| start + height <= total)
        .enumerate()
        .map(|(index, start)| Block {
            index,
            rows: start..start + height,
            cells: &table.rows()[start..start + height],
        })
        .collect();

    let covered = blocks.last().map_or(0, |b| b.rows.end);
    if covered < total {
        debug!("Ignoring {} rows after the last complete block", total - covered);
    }

    debug!(
        "Segmented {} rows into {} blocks of {} rows",
        total,
        blocks.len(),
        height
    );

    Ok(blocks)
}

/// Number of populated columns, judged from a block's first row.
///
/// The width ends at the first cell that is null, non-numeric or NaN. Other
/// rows of the block are assumed to share it.
pub fn valid_width(first_row: &[Cell]) -> usize {
    first_row
        .iter()
        .position(|cell| !is_numeric(cell))
        .unwrap_or(first_row.len())
}

fn is_numeric(cell: &Cell) -> bool {
    cell.as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .map_or(false, |v| !v.is_nan())
}

/// Truncate every row of `block` to its valid width.
pub fn clean_block(
    block: &Block<'_>,
    min_valid_width: usize,
) -> Result<CleanBlock, SegmentationError> {
    let width = valid_width(block.first_row());
    if width < min_valid_width {
        return Err(SegmentationError::MalformedBlock {
            block: block.index,
            valid_width: width,
            required: min_valid_width,
        });
    }

    let cells = block
        .cells
        .iter()
        .map(|row| row[..width.min(row.len())].to_vec())
        .collect();

    debug!("Block {} has valid width {}", block.index, width);

    Ok(CleanBlock {
        index: block.index,
        rows: block.rows.clone(),
        valid_width: width,
        cells,
    })
}

/// Clean every block in parallel, preserving block order.
///
/// The first malformed block (in block order) is reported.
pub fn clean_blocks(
    blocks: &[Block<'_>],
    min_valid_width: usize,
) -> Result<Vec<CleanBlock>, SegmentationError> {
    let results: Vec<Result<CleanBlock, SegmentationError>> = blocks
        .par_iter()
        .map(|block| clean_block(block, min_valid_width))
        .collect();

    results.into_iter().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn cell(s: &str) -> Cell {
        Some(s.to_string())
    }

    /// Table of `widths.len()` blocks; block `b` has `widths[b]` numeric columns.
    pub(crate) fn numeric_table(height: usize, widths: &[usize], max_columns: usize) -> RawTable {
        let mut rows = Vec::new();
        for (b, &w) in widths.iter().enumerate() {
            for r in 0..height {
                rows.push((0..w).map(|c| cell(&format!("{}.{}{}", b, r, c))).collect());
            }
        }
        RawTable::from_rows(rows, max_columns).unwrap()
    }

    #[test]
    fn test_segment_exact_multiple() {
        let table = numeric_table(10, &[3, 3, 3], 5);
        let config = SegmentationConfig::with_block_height(10);
        let blocks = segment_blocks(&table, &config).unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].rows, 0..10);
        assert_eq!(blocks[2].rows, 20..30);
        assert!(blocks.iter().all(|b| b.height() == 10));
    }

    #[test]
    fn test_segment_drops_trailing_rows() {
        let table = numeric_table(7, &[2, 2, 2], 4);
        let config = SegmentationConfig::with_block_height(8);
        let blocks = segment_blocks(&table, &config).unwrap();

        // 21 rows / 8 = 2 full blocks, 5 rows dropped
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].rows, 8..16);
    }

    #[test]
    fn test_segment_with_gap_rows() {
        // 186-row framing: 185 rows of data followed by 1 separator row
        let table = numeric_table(186, &[2, 2], 4);
        let config = SegmentationConfig {
            block_gap: 1,
            ..SegmentationConfig::with_block_height(185)
        };
        let blocks = segment_blocks(&table, &config).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rows, 0..185);
        assert_eq!(blocks[1].rows, 186..371);
    }

    #[test]
    fn test_segment_table_shorter_than_block() {
        let table = numeric_table(5, &[2], 4);
        let config = SegmentationConfig::with_block_height(6);
        assert!(segment_blocks(&table, &config).unwrap().is_empty());
    }

    #[test]
    fn test_segment_rejects_zero_height() {
        let table = numeric_table(6, &[2], 4);
        let config = SegmentationConfig::with_block_height(0);
        assert!(matches!(
            segment_blocks(&table, &config),
            Err(SegmentationError::Config(ConfigError::InvalidBlockHeight { .. }))
        ));
    }

    #[test]
    fn test_valid_width_stops_at_null_or_text() {
        assert_eq!(valid_width(&[cell("1"), cell("2"), None, cell("4")]), 2);
        assert_eq!(valid_width(&[cell("1"), cell("abc"), cell("3")]), 1);
        assert_eq!(valid_width(&[cell("1"), cell("NaN")]), 1);
        assert_eq!(valid_width(&[cell("1"), cell("2")]), 2);
        assert_eq!(valid_width(&[]), 0);
    }

    #[test]
    fn test_clean_block_truncates_every_row() {
        let mut rows: Vec<Vec<Cell>> = (0..8)
            .map(|r| (0..10).map(|c| cell(&format!("{}{}", r, c))).collect())
            .collect();
        // First row null at column 7; later rows still carry values there.
        rows[0][7] = None;
        let table = RawTable::from_rows(rows, 10).unwrap();
        let config = SegmentationConfig::with_block_height(8);
        let blocks = segment_blocks(&table, &config).unwrap();

        let clean = clean_block(&blocks[0], 6).unwrap();
        assert_eq!(clean.valid_width, 7);
        assert_eq!(clean.height(), 8);
        assert!(clean.cells.iter().all(|row| row.len() == 7));
        assert_eq!(clean.cells[5][6], cell("56"));
    }

    #[test]
    fn test_clean_block_rejects_narrow_block() {
        let table = numeric_table(6, &[4], 10);
        let config = SegmentationConfig::with_block_height(6);
        let blocks = segment_blocks(&table, &config).unwrap();

        match clean_block(&blocks[0], 6) {
            Err(SegmentationError::MalformedBlock {
                block,
                valid_width,
                required,
            }) => {
                assert_eq!(block, 0);
                assert_eq!(valid_width, 4);
                assert_eq!(required, 6);
            }
            other => panic!("Expected MalformedBlock, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_blocks_preserves_order() {
        let table = numeric_table(6, &[10, 7, 9], 10);
        let config = SegmentationConfig::with_block_height(6);
        let blocks = segment_blocks(&table, &config).unwrap();
        let clean = clean_blocks(&blocks, 6).unwrap();

        let widths: Vec<usize> = clean.iter().map(|b| b.valid_width).collect();
        assert_eq!(widths, vec![10, 7, 9]);
        let indices: Vec<usize> = clean.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_clean_blocks_reports_first_malformed_block() {
        let table = numeric_table(6, &[10, 3, 9, 2, 4], 10);
        let config = SegmentationConfig::with_block_height(6);
        let blocks = segment_blocks(&table, &config).unwrap();

        // Repeated to catch scheduling-dependent reporting
        for _ in 0..20 {
            match clean_blocks(&blocks, 6) {
                Err(SegmentationError::MalformedBlock {
                    block, valid_width, ..
                }) => {
                    assert_eq!(block, 1);
                    assert_eq!(valid_width, 3);
                }
                other => panic!("Expected MalformedBlock, got {:?}", other),
            }
        }
    }
}
