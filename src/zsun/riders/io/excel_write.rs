use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use crate::zsun::riders::error::{Result, RiderError};
use crate::zsun::riders::io::workbook::SheetGrid;
use crate::zsun::riders::model::CellValue;

/// Writes the provided sheets, in order, to the given path.
pub fn write_workbook(path: &Path, sheets: &[SheetGrid]) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(sheet.name())?;

        for (row_idx, row) in sheet.sheet().rows().iter().enumerate() {
            let row_number = u32::try_from(row_idx).map_err(|_| {
                RiderError::Destination(format!("sheet '{}' has too many rows", sheet.name()))
            })?;
            for (col_idx, cell) in row.iter().enumerate() {
                let column = u16::try_from(col_idx).map_err(|_| {
                    RiderError::Destination(format!("sheet '{}' has too many columns", sheet.name()))
                })?;
                write_cell(worksheet, row_number, column, cell)?;
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, column: u16, cell: &CellValue) -> Result<()> {
    match cell.clone().into_persisted() {
        CellValue::Empty => {}
        CellValue::Text(value) => {
            worksheet.write_string(row, column, &value)?;
        }
        CellValue::Float(value) => {
            worksheet.write_number(row, column, value)?;
        }
        CellValue::Int(value) => {
            worksheet.write_number(row, column, value as f64)?;
        }
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, column, value)?;
        }
        CellValue::Timestamp(_) => {
            return Err(RiderError::Destination(
                "timestamps must be persisted as text".to_string(),
            ));
        }
    }
    Ok(())
}
