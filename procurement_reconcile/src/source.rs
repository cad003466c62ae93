// Typed views over the three extracts.

use log::{debug, warn};

use crate::config::*;
use crate::key::normalize_ticket_id;

pub const REQUISITION_SOURCE: &str = "requisition";
pub const RELATIONSHIP_SOURCE: &str = "relationship";
pub const LOOKUP_SOURCE: &str = "project lookup";

/// Reads the requisition ledger. All six columns are required.
pub fn requisition_lines(
    table: &Table,
    cols: &RequisitionColumns,
) -> Result<Vec<RequisitionLine>, ReconcileError> {
    let reference_idx = table.require_column(REQUISITION_SOURCE, &cols.reference)?;
    let project_idx = table.require_column(REQUISITION_SOURCE, &cols.project)?;
    let material_idx = table.require_column(REQUISITION_SOURCE, &cols.material)?;
    let description_idx = table.require_column(REQUISITION_SOURCE, &cols.description)?;
    let quantity_idx = table.require_column(REQUISITION_SOURCE, &cols.quantity)?;
    let value_idx = table.require_column(REQUISITION_SOURCE, &cols.value)?;

    let mut res: Vec<RequisitionLine> = Vec::with_capacity(table.rows.len());
    for (lineno, row) in table.rows.iter().enumerate() {
        let value_cell = cell_at(row, Some(value_idx));
        let value = value_cell.as_number();
        if value.is_none() && !value_cell.is_empty() {
            warn!(
                "requisition_lines: line {}: value {:?} is not a number, counted as zero",
                lineno, value_cell
            );
        }
        res.push(RequisitionLine {
            reference: cell_at(row, Some(reference_idx))
                .as_text()
                .unwrap_or_default(),
            project: cell_at(row, Some(project_idx))
                .as_text()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            material: cell_at(row, Some(material_idx)).as_text(),
            description: cell_at(row, Some(description_idx)).as_text(),
            quantity: cell_at(row, Some(quantity_idx)).as_text(),
            value,
        });
    }
    debug!("requisition_lines: read {} lines", res.len());
    Ok(res)
}

/// Reads the relationship export. Only the ticket id column is required;
/// metadata columns that are absent read as empty cells.
///
/// Rows whose ticket id cannot be normalized are dropped here. No
/// de-duplication happens at this stage.
pub fn relationship_records(
    table: &Table,
    cols: &RelationshipColumns,
) -> Result<Vec<RelationshipRecord>, ReconcileError> {
    let ticket_idx = table.require_column(RELATIONSHIP_SOURCE, &cols.ticket_id)?;
    let optional = |name: &String| {
        let idx = table.column_index(name);
        if idx.is_none() {
            warn!(
                "relationship_records: column {:?} not found, values will be left blank",
                name
            );
        }
        idx
    };
    let name_idx = optional(&cols.name);
    let created_idx = optional(&cols.created_on);
    let requester_idx = optional(&cols.requester);
    let approver_idx = optional(&cols.approver);
    let received_idx = optional(&cols.received_on);
    let status_idx = optional(&cols.status);

    let mut res: Vec<RelationshipRecord> = Vec::new();
    let mut dropped = 0usize;
    for row in table.rows.iter() {
        let ticket_id = match normalize_ticket_id(&cell_at(row, Some(ticket_idx))) {
            Some(t) => t,
            None => {
                dropped += 1;
                continue;
            }
        };
        res.push(RelationshipRecord {
            ticket_id,
            name: cell_at(row, name_idx),
            created_on: cell_at(row, created_idx),
            requester: cell_at(row, requester_idx),
            approver: cell_at(row, approver_idx),
            received_on: cell_at(row, received_idx),
            status: cell_at(row, status_idx),
        });
    }
    if dropped > 0 {
        warn!(
            "relationship_records: {} rows without a numeric ticket id were skipped",
            dropped
        );
    }
    Ok(res)
}

/// Reads the project lookup. Codes are trimmed; rows without a code are skipped.
pub fn project_entries(
    table: &Table,
    cols: &LookupColumns,
) -> Result<Vec<ProjectEntry>, ReconcileError> {
    let code_idx = table.require_column(LOOKUP_SOURCE, &cols.project_code)?;
    let name_idx = table.require_column(LOOKUP_SOURCE, &cols.project_name)?;
    let res: Vec<ProjectEntry> = table
        .rows
        .iter()
        .filter_map(|row| {
            let code = cell_at(row, Some(code_idx)).as_text()?.trim().to_string();
            if code.is_empty() {
                return None;
            }
            Some(ProjectEntry {
                code,
                name: cell_at(row, Some(name_idx)),
            })
        })
        .collect();
    debug!("project_entries: read {} entries", res.len());
    Ok(res)
}
