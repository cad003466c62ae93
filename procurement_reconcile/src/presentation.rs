use log::debug;
use std::collections::HashMap;

use crate::config::*;
use crate::upsert::UpsertPlan;

#[derive(PartialEq, Debug, Clone)]
pub struct HeaderStyle {
    pub columns: u32,
    pub fill: String,
    pub font_color: String,
    pub height: f64,
}

/// Style of one data cell. All data cells get thin borders and centred text.
#[derive(PartialEq, Debug, Clone)]
pub struct CellStyle {
    pub row: u32,
    pub column: u32,
    pub wrap: bool,
    pub number_format: Option<String>,
}

/// Everything the formatter does to the output document.
#[derive(PartialEq, Debug, Clone)]
pub struct PresentationPlan {
    pub header: HeaderStyle,
    pub cells: Vec<CellStyle>,
    /// (1-based column, width)
    pub widths: Vec<(u32, f64)>,
}

/// Plans the formatting of the header row and of the rows appended by the
/// upsert. Rows that existed before are left alone.
pub fn plan_presentation(
    header: &[String],
    upsert: &UpsertPlan,
    settings: &PresentationSettings,
) -> PresentationPlan {
    let columns = header.len() as u32;
    let by_name: HashMap<&str, u32> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim(), idx as u32 + 1))
        .collect();
    let wrap_cols: Vec<u32> = settings
        .wrap_columns
        .iter()
        .filter_map(|n| by_name.get(n.as_str()).cloned())
        .collect();
    let currency_col = by_name.get(settings.currency_column.as_str()).cloned();

    // The values written in the new rows decide the number formats.
    let written: HashMap<(u32, u32), &CellValue> = upsert
        .writes
        .iter()
        .map(|w| ((w.row, w.column), &w.value))
        .collect();

    let mut cells: Vec<CellStyle> = Vec::new();
    for row in upsert.appended_rows.iter() {
        for column in 1..=columns {
            let value = written.get(&(*row, column));
            let number_format = match value {
                Some(CellValue::Number(_)) if Some(column) == currency_col => {
                    Some(settings.currency_format.clone())
                }
                Some(CellValue::Date(_)) => Some(settings.date_format.clone()),
                _ => None,
            };
            cells.push(CellStyle {
                row: *row,
                column,
                wrap: wrap_cols.contains(&column),
                number_format,
            });
        }
    }

    let widths: Vec<(u32, f64)> = settings
        .column_widths
        .iter()
        .filter_map(|(name, w)| by_name.get(name.as_str()).map(|c| (*c, *w)))
        .collect();
    debug!(
        "plan_presentation: {} styled cells, {} column widths",
        cells.len(),
        widths.len()
    );

    PresentationPlan {
        header: HeaderStyle {
            columns,
            fill: settings.header_fill.clone(),
            font_color: settings.header_font_color.clone(),
            height: settings.header_height,
        },
        cells,
        widths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upsert::CellWrite;

    fn header() -> Vec<String> {
        ["SC", "WBS", "CONTEÚDO", "VALOR", "DATA CRIAÇÃO", "Extra"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn upsert() -> UpsertPlan {
        UpsertPlan {
            writes: vec![
                CellWrite { row: 2, column: 4, value: CellValue::Number(9.0) },
                CellWrite { row: 5, column: 3, value: CellValue::Text("Valve".to_string()) },
                CellWrite { row: 5, column: 4, value: CellValue::Number(1500.0) },
                CellWrite { row: 5, column: 5, value: CellValue::Date(45000.0) },
            ],
            updated_rows: vec![2],
            appended_rows: vec![5],
            missing_columns: vec![],
        }
    }

    #[test]
    fn only_appended_rows_are_styled() {
        let plan = plan_presentation(&header(), &upsert(), &PresentationSettings::default());
        assert_eq!(plan.header.columns, 6);
        assert_eq!(plan.cells.len(), 6);
        assert!(plan.cells.iter().all(|c| c.row == 5));
    }

    #[test]
    fn wrap_and_number_formats() {
        let settings = PresentationSettings::default();
        let plan = plan_presentation(&header(), &upsert(), &settings);
        let cell = |col: u32| plan.cells.iter().find(|c| c.column == col).unwrap().clone();
        assert!(cell(3).wrap);
        assert!(!cell(1).wrap);
        assert_eq!(cell(4).number_format, Some(settings.currency_format.clone()));
        assert_eq!(cell(5).number_format, Some(settings.date_format.clone()));
        assert_eq!(cell(6).number_format, None);
    }

    #[test]
    fn widths_follow_the_table() {
        let plan = plan_presentation(&header(), &upsert(), &PresentationSettings::default());
        assert!(plan.widths.contains(&(1, 15.0)));
        assert!(plan.widths.contains(&(3, 50.0)));
        assert!(!plan.widths.iter().any(|(c, _)| *c == 6));
    }

    #[test]
    fn planning_is_deterministic() {
        let settings = PresentationSettings::default();
        let a = plan_presentation(&header(), &upsert(), &settings);
        let b = plan_presentation(&header(), &upsert(), &settings);
        assert_eq!(a, b);
    }
}
