//! Turns the repository contents and a destination's existing rows into the
//! smallest set of contiguous range writes.
//!
//! Rows are scanned top to bottom. A row whose key cell names a rider in the
//! repository extends the open block with that rider's values; any other row
//! closes the open block and is left untouched. Each resulting block is one
//! maximal run of matching rows and needs exactly one range write.

use tracing::debug;

use crate::zsun::riders::model::CellValue;
use crate::zsun::riders::repository::RiderRepository;

/// A contiguous run of destination rows plus their replacement values.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    /// 1-based sheet row of the first row in the block.
    pub start_row: u32,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowBlock {
    /// 1-based sheet row of the last row in the block.
    pub fn end_row(&self) -> u32 {
        self.start_row + self.rows.len().saturating_sub(1) as u32
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of one diff pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetDiff {
    pub blocks: Vec<RowBlock>,
    /// Rows examined before the scan stopped.
    pub rows_scanned: usize,
    /// Rows that matched a rider and will be overwritten.
    pub rows_matched: usize,
}

impl SheetDiff {
    pub fn write_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Computes the blocks to write.
///
/// `rows[i]` is sheet row `first_row + i`; the first cell of each row is
/// its key. Rows past `row_limit` (a 1-based sheet row, inclusive) are not
/// scanned.
pub fn diff_blocks(
    repository: &RiderRepository,
    rows: &[Vec<CellValue>],
    first_row: u32,
    row_limit: u32,
) -> SheetDiff {
    let mut diff = SheetDiff::default();
    let mut open: Option<RowBlock> = None;

    for (offset, row) in rows.iter().enumerate() {
        let Some(row_number) = u32::try_from(offset)
            .ok()
            .and_then(|offset| first_row.checked_add(offset))
        else {
            break;
        };
        if row_number > row_limit {
            break;
        }
        diff.rows_scanned += 1;

        let rider = row
            .first()
            .and_then(CellValue::as_rider_key)
            .and_then(|key| repository.get_by_id(&key));

        match rider {
            Some(rider) => {
                diff.rows_matched += 1;
                open.get_or_insert_with(|| RowBlock {
                    start_row: row_number,
                    rows: Vec::new(),
                })
                .rows
                .push(rider.to_row());
            }
            None => {
                if let Some(block) = open.take() {
                    diff.blocks.push(block);
                }
            }
        }
    }

    if let Some(block) = open.take() {
        diff.blocks.push(block);
    }

    debug!(
        rows_scanned = diff.rows_scanned,
        rows_matched = diff.rows_matched,
        block_count = diff.blocks.len(),
        "sheet diff computed"
    );
    diff
}
