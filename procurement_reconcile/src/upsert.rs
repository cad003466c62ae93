//! Upsert of the report rows into the master document.
//!
//! The merge is computed as a patch set: a list of cell writes in sheet
//! coordinates. The same plan is applied to the in-memory [`MasterSheet`]
//! and, by the command line tool, to the loaded workbook, so that every
//! cell outside the plan keeps its content and formatting.

use log::{debug, info};
use std::collections::HashMap;

use crate::config::*;
use crate::key::normalize_master_ticket;

/// The values of the active worksheet of the master document.
///
/// `rows[i]` is sheet row `i + 2`; row 1 is the header.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct MasterSheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// A single write, in 1-based sheet coordinates.
#[derive(PartialEq, Debug, Clone)]
pub struct CellWrite {
    pub row: u32,
    pub column: u32,
    pub value: CellValue,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct UpsertPlan {
    pub writes: Vec<CellWrite>,
    /// Existing rows that received at least one write.
    pub updated_rows: Vec<u32>,
    /// Rows created by this plan, in creation order.
    pub appended_rows: Vec<u32>,
    /// Managed columns the master document does not have.
    pub missing_columns: Vec<String>,
}

impl UpsertPlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl MasterSheet {
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> MasterSheet {
        MasterSheet { header, rows }
    }

    /// The last used row of the sheet (the header counts).
    pub fn last_row(&self) -> u32 {
        self.rows.len() as u32 + 1
    }

    /// Column name to 1-based column number. On duplicated names the last
    /// column wins.
    pub fn column_map(&self) -> HashMap<String, u32> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(idx, name)| (name.trim().to_string(), idx as u32 + 1))
            .collect()
    }

    pub fn value(&self, row: u32, column: u32) -> CellValue {
        if row < 2 || column < 1 {
            return CellValue::Empty;
        }
        self.rows
            .get((row - 2) as usize)
            .and_then(|r| r.get((column - 1) as usize))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /// Applies the writes of a plan, growing the sheet when needed.
    pub fn apply(&mut self, plan: &UpsertPlan) {
        for w in plan.writes.iter() {
            if w.row < 2 || w.column < 1 {
                continue;
            }
            let r = (w.row - 2) as usize;
            let c = (w.column - 1) as usize;
            while self.rows.len() <= r {
                self.rows.push(Vec::new());
            }
            let row = &mut self.rows[r];
            while row.len() <= c {
                row.push(CellValue::Empty);
            }
            row[c] = w.value.clone();
        }
    }
}

fn cell_key_text(v: &CellValue) -> String {
    v.as_text().unwrap_or_default()
}

/// Indexes the existing rows by (ticket id, project id).
///
/// Rows missing either part are not indexed. When two rows share a key the
/// later one is the target.
pub fn key_index(sheet: &MasterSheet, ticket_col: u32, project_col: u32) -> HashMap<(String, String), u32> {
    let mut index: HashMap<(String, String), u32> = HashMap::new();
    for (i, _) in sheet.rows.iter().enumerate() {
        let row = i as u32 + 2;
        let ticket = normalize_master_ticket(&cell_key_text(&sheet.value(row, ticket_col)));
        let project = cell_key_text(&sheet.value(row, project_col)).trim().to_string();
        if !ticket.is_empty() && !project.is_empty() {
            index.insert((ticket, project), row);
        }
    }
    index
}

/// Computes the writes that bring the report rows into the master sheet.
///
/// Matching rows only get their managed columns overwritten, and only with
/// non-empty incoming values. Other rows are appended below the last row,
/// filled in the managed columns only.
pub fn plan_upsert(
    sheet: &MasterSheet,
    rows: &[ManagedReportRow],
    cols: &ReportColumns,
) -> Result<UpsertPlan, ReconcileError> {
    let col_map = sheet.column_map();
    let ticket_col = *col_map
        .get(cols.ticket_id.as_str())
        .ok_or_else(|| ReconcileError::MissingKeyColumn {
            column: cols.ticket_id.clone(),
        })?;
    let project_col = *col_map
        .get(cols.project.as_str())
        .ok_or_else(|| ReconcileError::MissingKeyColumn {
            column: cols.project.clone(),
        })?;

    let managed: Vec<(String, u32)> = cols
        .managed()
        .into_iter()
        .filter_map(|name| col_map.get(name.as_str()).map(|c| (name.clone(), *c)))
        .collect();
    let missing_columns: Vec<String> = cols
        .managed()
        .into_iter()
        .filter(|name| !col_map.contains_key(name.as_str()))
        .collect();
    if !missing_columns.is_empty() {
        info!(
            "plan_upsert: managed columns absent from the master document: {:?}",
            missing_columns
        );
    }

    let mut index = key_index(sheet, ticket_col, project_col);
    let mut plan = UpsertPlan {
        missing_columns,
        ..UpsertPlan::default()
    };
    let mut next_row = sheet.last_row() + 1;

    for record in rows.iter() {
        let key = (
            normalize_master_ticket(&record.ticket_id),
            record.project.trim().to_string(),
        );
        let (target, is_new) = match index.get(&key) {
            Some(r) => (*r, false),
            None => {
                let r = next_row;
                next_row += 1;
                index.insert(key.clone(), r);
                plan.appended_rows.push(r);
                (r, true)
            }
        };
        let mut written = false;
        for (name, column) in managed.iter() {
            match record.get(name) {
                Some(v) if !v.is_empty() => {
                    plan.writes.push(CellWrite {
                        row: target,
                        column: *column,
                        value: v.clone(),
                    });
                    written = true;
                }
                _ => {}
            }
        }
        if written && !is_new && !plan.updated_rows.contains(&target) {
            plan.updated_rows.push(target);
        }
        debug!(
            "plan_upsert: key {:?} -> row {} ({})",
            key,
            target,
            if is_new { "new" } else { "update" }
        );
    }
    info!(
        "plan_upsert: {} rows updated, {} rows appended, {} cell writes",
        plan.updated_rows.len(),
        plan.appended_rows.len(),
        plan.writes.len()
    );
    Ok(plan)
}
