use crate::zsun::riders::error::{Result, RiderError};
use crate::zsun::riders::model::CellValue;

/// Row-oriented tabular destination. Row numbers are 1-based sheet rows.
pub trait Destination {
    /// Returns every row from `first_row` down to the last used row.
    fn get_all_rows(&mut self, first_row: u32) -> Result<Vec<Vec<CellValue>>>;

    /// Overwrites `rows.len()` consecutive rows starting at `start_row`.
    /// Cells to the right of each written row are left as they were.
    fn write_contiguous_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()>;

    /// Appends a row after the last used row.
    fn append_header_row(&mut self, values: &[String]) -> Result<()>;

    /// Persists buffered writes. Destinations that write through do nothing.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A destination held entirely in memory. Row `n` lives at index `n - 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    rows: Vec<Vec<CellValue>>,
    write_calls: usize,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows,
            write_calls: 0,
        }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }

    /// Number of range writes issued so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Returns the cell at the given 1-based row and 0-based column.
    pub fn cell(&self, row: u32, column: usize) -> Option<&CellValue> {
        let index = usize::try_from(row).ok()?.checked_sub(1)?;
        self.rows.get(index)?.get(column)
    }

    /// Used rows, ignoring trailing rows with no content.
    fn used_len(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|index| index + 1)
            .unwrap_or(0)
    }
}

impl Destination for MemorySheet {
    fn get_all_rows(&mut self, first_row: u32) -> Result<Vec<Vec<CellValue>>> {
        let start = row_index(first_row)?;
        let end = self.used_len();
        Ok(self.rows.get(start..end).map(<[_]>::to_vec).unwrap_or_default())
    }

    fn write_contiguous_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()> {
        let start = row_index(start_row)?;
        if self.rows.len() < start + rows.len() {
            self.rows.resize_with(start + rows.len(), Vec::new);
        }
        for (offset, row) in rows.iter().enumerate() {
            write_row(&mut self.rows[start + offset], row);
        }
        self.write_calls += 1;
        Ok(())
    }

    fn append_header_row(&mut self, values: &[String]) -> Result<()> {
        let used = self.used_len();
        self.rows.truncate(used);
        self.rows
            .push(values.iter().cloned().map(CellValue::Text).collect());
        Ok(())
    }
}

/// Converts a 1-based row number into a vector index.
pub(crate) fn row_index(row: u32) -> Result<usize> {
    let row = usize::try_from(row).map_err(|_| {
        RiderError::Destination(format!("row {row} is out of range for this platform"))
    })?;
    row.checked_sub(1)
        .ok_or_else(|| RiderError::Destination("row numbers start at 1".to_string()))
}

/// Overwrites the leading cells of `target` with the persisted form of
/// `values`.
pub(crate) fn write_row(target: &mut Vec<CellValue>, values: &[CellValue]) {
    if target.len() < values.len() {
        target.resize(values.len(), CellValue::Empty);
    }
    for (slot, value) in target.iter_mut().zip(values) {
        *slot = value.clone().into_persisted();
    }
}
