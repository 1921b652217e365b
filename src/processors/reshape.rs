//! Joins cleaned blocks side by side into one column per scan.

use log::debug;

use crate::core::loaders::Cell;
use super::segmentation::CleanBlock;

/// All cells of one scan, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanColumn {
    /// Block the column came from
    pub block: usize,
    pub cells: Vec<Cell>,
}

/// Reshaped table: column `i` is the full record of scan `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanTable {
    columns: Vec<ScanColumn>,
}

impl ScanTable {
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ScanColumn> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[ScanColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ScanColumn> {
        self.columns
    }
}

/// Concatenate `blocks` along the column axis.
///
/// Block 0's columns come first, then block 1's and so on, and the result is
/// numbered contiguously from 0.
pub fn reshape_blocks(blocks: &[CleanBlock]) -> ScanTable {
    let total: usize = blocks.iter().map(|b| b.valid_width).sum();
    let mut columns = Vec::with_capacity(total);

    for block in blocks {
        for col in 0..block.valid_width {
            let cells = block
                .cells
                .iter()
                .map(|row| row.get(col).cloned().flatten())
                .collect();
            columns.push(ScanColumn {
                block: block.index,
                cells,
            });
        }
    }

    debug!(
        "Reshaped {} blocks into {} scan columns",
        blocks.len(),
        columns.len()
    );

    ScanTable { columns }
}
