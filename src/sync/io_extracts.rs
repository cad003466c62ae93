// Primitives for reading the extracts (xlsx) into tables.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::sync::*;

pub fn convert_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::String(s) if s.trim().is_empty() => CellValue::Empty,
        DataType::String(s) => CellValue::Text(s.clone()),
        DataType::Bool(b) => CellValue::Bool(*b),
        DataType::DateTime(f) => CellValue::Date(*f),
        // Errors such as #N/A read as missing values.
        _ => CellValue::Empty,
    }
}

fn header_name(cell: &DataType) -> String {
    convert_cell(cell)
        .as_text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Builds a table from a worksheet range. `header_offset` is the number of
/// rows above the header row, counted from the top of the sheet.
pub fn range_to_table(range: &Range<DataType>, header_offset: usize) -> Table {
    // The range starts at the first used cell, not at the top of the sheet.
    let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let header_idx = match header_offset.checked_sub(start_row) {
        Some(idx) => idx,
        None => {
            warn!(
                "range_to_table: header row {} is blank (data starts at row {})",
                header_offset + 1,
                start_row + 1
            );
            return Table::default();
        }
    };

    let mut iter = range.rows().skip(header_idx);
    let header: Vec<String> = match iter.next() {
        Some(row) => row.iter().map(header_name).collect(),
        None => return Table::default(),
    };
    debug!("range_to_table: header: {:?}", header);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for row in iter {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(cells);
    }
    Table::new(header, rows)
}

fn open_range(path: &str, worksheet: Option<&str>) -> SyncResult<Range<DataType>> {
    debug!("open_range: path: {:?} worksheet: {:?}", path, worksheet);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let range = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                worksheet: name,
                path,
            })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(range)
}

/// Reads one worksheet (the first one when no name is given) into a table.
pub fn read_table(path: &str, worksheet: Option<&str>, header_offset: usize) -> SyncResult<Table> {
    let range = open_range(path, worksheet)?;
    let table = range_to_table(&range, header_offset);
    info!(
        "read_table: {}: {} columns, {} rows",
        path,
        table.header.len(),
        table.rows.len()
    );
    Ok(table)
}

/// Reads the (project code, project name) pairs of the listed worksheets.
/// Worksheets without the two columns contribute nothing.
pub fn read_project_pairs(
    path: &str,
    worksheets: &[(String, usize)],
    cols: &LookupColumns,
) -> SyncResult<Vec<(String, String)>> {
    let mut res: Vec<(String, String)> = Vec::new();
    for (worksheet, offset) in worksheets.iter() {
        let table = read_table(path, Some(worksheet.as_str()), *offset)?;
        let (code_idx, name_idx) = match (
            table.column_index(&cols.project_code),
            table.column_index(&cols.project_name),
        ) {
            (Some(c), Some(n)) => (c, n),
            _ => {
                warn!(
                    "read_project_pairs: worksheet {} has no {} / {} columns",
                    worksheet, cols.project_code, cols.project_name
                );
                continue;
            }
        };
        for row in table.rows.iter() {
            let code = cell_at(row, Some(code_idx)).as_text();
            let name = cell_at(row, Some(name_idx)).as_text();
            if let (Some(c), Some(n)) = (code, name) {
                res.push((c, n));
            }
        }
    }
    Ok(res)
}
