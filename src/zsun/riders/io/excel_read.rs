use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::{DateTime, Utc};

use crate::zsun::riders::error::{Result, RiderError};
use crate::zsun::riders::io::destination::MemorySheet;
use crate::zsun::riders::io::workbook::SheetGrid;
use crate::zsun::riders::model::CellValue;

/// Days between the Excel serial date origin (1899-12-30) and 1970-01-01.
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Reads every sheet of an `.xlsx` workbook into dense grids.
///
/// Cells keep their absolute position: leading empty rows and columns that
/// calamine trims from a range are padded back in, so grid row `n` is sheet
/// row `n`.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetGrid>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = read_required_sheet(&mut workbook, &name)?;
        sheets.push(SheetGrid::new(name, MemorySheet::from_rows(range_to_rows(&range))));
    }
    Ok(sheets)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| RiderError::Destination(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(RiderError::from)?;
    Ok(range)
}

fn range_to_rows(range: &calamine::Range<DataType>) -> Vec<Vec<CellValue>> {
    let Some((first_row, first_column)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; first_column as usize];
        cells.extend(row.iter().map(cell_to_value));
        while cells.last().is_some_and(CellValue::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }
    rows
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) if value.is_empty() => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Int(value) => CellValue::Int(*value),
        DataType::Float(value) => float_to_value(*value),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => excel_serial_to_timestamp(*serial)
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Float(*serial)),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

/// Excel stores every number as a float; integral values come back as
/// integers so identifiers compare as written.
fn float_to_value(value: f64) -> CellValue {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        CellValue::Int(value as i64)
    } else {
        CellValue::Float(value)
    }
}

fn excel_serial_to_timestamp(serial: f64) -> Option<DateTime<Utc>> {
    let millis = ((serial - EXCEL_UNIX_EPOCH_DAYS) * MILLIS_PER_DAY).round();
    if !millis.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
}
