use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::zsun::riders::error::Result;
use crate::zsun::riders::io::destination::{Destination, MemorySheet};
use crate::zsun::riders::io::{excel_read, excel_write};
use crate::zsun::riders::model::CellValue;

/// A named sheet held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    name: String,
    sheet: MemorySheet,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, sheet: MemorySheet) -> Self {
        Self {
            name: name.into(),
            sheet,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet(&self) -> &MemorySheet {
        &self.sheet
    }
}

/// An `.xlsx` workbook acting as the destination for one of its sheets.
///
/// The workbook is read once on open; writes are buffered and the whole
/// workbook is rewritten on [`flush`](Destination::flush). Other sheets are
/// carried through by value.
#[derive(Debug)]
pub struct WorkbookDestination {
    path: PathBuf,
    sheets: Vec<SheetGrid>,
    target: usize,
    dirty: bool,
}

impl WorkbookDestination {
    /// Opens `path` (or starts an empty workbook when it does not exist)
    /// and targets `sheet_name`, creating that sheet if needed.
    #[instrument(level = "debug", skip_all, fields(path = %path.display(), sheet = sheet_name))]
    pub fn open(path: &Path, sheet_name: &str) -> Result<Self> {
        let mut sheets = if path.exists() {
            excel_read::read_workbook(path)?
        } else {
            debug!("workbook does not exist yet, starting empty");
            Vec::new()
        };

        let target = match sheets.iter().position(|sheet| sheet.name == sheet_name) {
            Some(index) => index,
            None => {
                sheets.push(SheetGrid::new(sheet_name, MemorySheet::new()));
                sheets.len() - 1
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
            target,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The targeted sheet as currently buffered.
    pub fn sheet(&self) -> &MemorySheet {
        &self.sheets[self.target].sheet
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(SheetGrid::name).collect()
    }

    fn target_mut(&mut self) -> &mut MemorySheet {
        &mut self.sheets[self.target].sheet
    }
}

impl Destination for WorkbookDestination {
    fn get_all_rows(&mut self, first_row: u32) -> Result<Vec<Vec<CellValue>>> {
        self.target_mut().get_all_rows(first_row)
    }

    fn write_contiguous_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()> {
        self.target_mut().write_contiguous_rows(start_row, rows)?;
        self.dirty = true;
        Ok(())
    }

    fn append_header_row(&mut self, values: &[String]) -> Result<()> {
        self.target_mut().append_header_row(values)?;
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        excel_write::write_workbook(&self.path, &self.sheets)?;
        self.dirty = false;
        info!(path = %self.path.display(), sheets = self.sheets.len(), "workbook saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn round_trips_sheets_through_xlsx() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("squad.xlsx");

        let mut destination = WorkbookDestination::open(&path, "Squad").expect("new workbook");
        destination
            .append_header_row(&["Zwift ID".to_string(), "Name".to_string()])
            .expect("header appended");
        destination
            .write_contiguous_rows(
                2,
                &[
                    vec![text("101"), text("Alice"), CellValue::Float(61.5)],
                    vec![CellValue::Int(102), text("Bob"), CellValue::Bool(true)],
                ],
            )
            .expect("rows written");
        destination.flush().expect("workbook saved");

        let mut reopened = WorkbookDestination::open(&path, "Squad").expect("existing workbook");
        let rows = reopened.get_all_rows(1).expect("rows read");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![text("Zwift ID"), text("Name")]);
        assert_eq!(rows[1], vec![text("101"), text("Alice"), CellValue::Float(61.5)]);
        assert_eq!(rows[2], vec![CellValue::Int(102), text("Bob"), CellValue::Bool(true)]);
    }

    #[test]
    fn other_sheets_are_carried_through() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("club.xlsx");

        let mut notes = WorkbookDestination::open(&path, "Notes").expect("new workbook");
        notes
            .write_contiguous_rows(1, &[vec![text("keep me")]])
            .expect("note written");
        notes.flush().expect("workbook saved");

        let mut squad = WorkbookDestination::open(&path, "Squad").expect("existing workbook");
        squad
            .append_header_row(&["Zwift ID".to_string()])
            .expect("header appended");
        squad.flush().expect("workbook saved");

        let reopened = WorkbookDestination::open(&path, "Notes").expect("existing workbook");
        assert_eq!(reopened.sheet_names(), vec!["Notes", "Squad"]);
        assert_eq!(reopened.sheet().cell(1, 0), Some(&text("keep me")));
    }
}
