// Read-modify-write of the master workbook.
//
// Only the cells named by the plans are touched: every other cell keeps its
// value and its style.

use procurement_reconcile::presentation::PresentationPlan;
use procurement_reconcile::upsert::{MasterSheet, UpsertPlan};
use umya_spreadsheet::{
    Border, HorizontalAlignmentValues, Spreadsheet, VerticalAlignmentValues, Worksheet,
};

use crate::sync::*;

pub fn open_master(path: &str) -> SyncResult<Spreadsheet> {
    info!("open_master: reading {}", path);
    umya_spreadsheet::reader::xlsx::read(path).context(OpeningMasterSnafu { path })
}

pub fn write_master(book: &Spreadsheet, path: &str) -> SyncResult<()> {
    umya_spreadsheet::writer::xlsx::write(book, path).context(WritingMasterSnafu { path })?;
    info!("write_master: wrote {}", path);
    Ok(())
}

fn read_cell(sheet: &Worksheet, column: u32, row: u32) -> CellValue {
    let cell = match sheet.get_cell((column, row)) {
        Some(c) => c,
        None => return CellValue::Empty,
    };
    let raw = cell.get_value().to_string();
    if raw.trim().is_empty() {
        return CellValue::Empty;
    }
    match cell.get_data_type() {
        "n" => raw
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Text(raw)),
        "b" => CellValue::Bool(raw == "1" || raw.eq_ignore_ascii_case("true")),
        _ => CellValue::Text(raw),
    }
}

/// The values of the active worksheet. Row 1 is the header.
pub fn master_sheet(book: &Spreadsheet) -> MasterSheet {
    let sheet = book.get_active_sheet();
    let (columns, last_row) = sheet.get_highest_column_and_row();
    let header: Vec<String> = (1..=columns)
        .map(|c| {
            read_cell(sheet, c, 1)
                .as_text()
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        })
        .collect();
    let rows: Vec<Vec<CellValue>> = (2..=last_row)
        .map(|r| (1..=columns).map(|c| read_cell(sheet, c, r)).collect())
        .collect();
    debug!(
        "master_sheet: {} columns, {} data rows, header: {:?}",
        columns,
        rows.len(),
        header
    );
    MasterSheet::new(header, rows)
}

/// Writes the cell values of the plan into the active worksheet.
pub fn apply_upsert(book: &mut Spreadsheet, plan: &UpsertPlan, date_format: &str) {
    let sheet = book.get_active_sheet_mut();
    for w in plan.writes.iter() {
        let coord = (w.column, w.row);
        match &w.value {
            CellValue::Empty => {}
            CellValue::Text(s) => {
                sheet.get_cell_mut(coord).set_value_string(s.clone());
            }
            CellValue::Number(f) => {
                sheet.get_cell_mut(coord).set_value_number(*f);
            }
            CellValue::Bool(b) => {
                sheet.get_cell_mut(coord).set_value_bool(*b);
            }
            CellValue::Date(f) => {
                sheet.get_cell_mut(coord).set_value_number(*f);
                // A bare serial number would display as a number.
                sheet
                    .get_style_mut(coord)
                    .get_number_format_mut()
                    .set_format_code(date_format);
            }
        }
    }
    debug!("apply_upsert: {} cells written", plan.writes.len());
}

fn thin_borders(sheet: &mut Worksheet, coord: (u32, u32)) {
    let borders = sheet.get_style_mut(coord).get_borders_mut();
    borders.get_left_mut().set_border_style(Border::BORDER_THIN);
    borders.get_right_mut().set_border_style(Border::BORDER_THIN);
    borders.get_top_mut().set_border_style(Border::BORDER_THIN);
    borders.get_bottom_mut().set_border_style(Border::BORDER_THIN);
}

fn centre(sheet: &mut Worksheet, coord: (u32, u32), wrap: bool) {
    let alignment = sheet.get_style_mut(coord).get_alignment_mut();
    alignment.set_horizontal(HorizontalAlignmentValues::Center);
    alignment.set_vertical(VerticalAlignmentValues::Center);
    alignment.set_wrap_text(wrap);
}

/// Applies the formatting plan to the active worksheet.
pub fn apply_presentation(book: &mut Spreadsheet, plan: &PresentationPlan) {
    let sheet = book.get_active_sheet_mut();

    for column in 1..=plan.header.columns {
        let coord = (column, 1);
        {
            let style = sheet.get_style_mut(coord);
            style.set_background_color(plan.header.fill.as_str());
            let font = style.get_font_mut();
            font.set_bold(true);
            font.get_color_mut().set_argb(plan.header.font_color.as_str());
        }
        thin_borders(sheet, coord);
        centre(sheet, coord, false);
    }
    sheet.get_row_dimension_mut(&1).set_height(plan.header.height);

    for cell in plan.cells.iter() {
        let coord = (cell.column, cell.row);
        thin_borders(sheet, coord);
        centre(sheet, coord, cell.wrap);
        if let Some(format) = &cell.number_format {
            sheet
                .get_style_mut(coord)
                .get_number_format_mut()
                .set_format_code(format.as_str());
        }
    }

    for (column, width) in plan.widths.iter() {
        sheet
            .get_column_dimension_by_number_mut(column)
            .set_width(*width);
    }
    debug!(
        "apply_presentation: header of {} columns, {} data cells, {} widths",
        plan.header.columns,
        plan.cells.len(),
        plan.widths.len()
    );
}
