use log::debug;
use std::collections::{HashMap, HashSet};

use crate::aggregate::TEXT_DELIMITER;
use crate::config::*;

/// Final grouping, after enrichment: one record per (ticket id, project).
///
/// The content fragments are merged without duplicates; every other field
/// keeps the value of the first record of the group.
pub fn consolidate(records: Vec<EnrichedRecord>) -> Vec<EnrichedRecord> {
    let mut res: Vec<EnrichedRecord> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut seen: Vec<HashSet<String>> = Vec::new();
    for r in records.into_iter() {
        let k = (r.ticket_id.clone(), r.project.clone());
        match positions.get(&k) {
            Some(&pos) => {
                debug!("consolidate: merging duplicate key {:?}", k);
                for d in r.descriptions.into_iter() {
                    if seen[pos].insert(d.clone()) {
                        res[pos].descriptions.push(d);
                    }
                }
            }
            None => {
                positions.insert(k, res.len());
                seen.push(r.descriptions.iter().cloned().collect());
                res.push(r);
            }
        }
    }
    res
}

fn text_or_empty(s: String) -> CellValue {
    if s.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s)
    }
}

/// Renames the enriched records into the reporting vocabulary.
pub fn to_report_rows(records: &[EnrichedRecord], cols: &ReportColumns) -> Vec<ManagedReportRow> {
    records
        .iter()
        .map(|r| {
            let rel = &r.relationship;
            let values: Vec<(String, CellValue)> = vec![
                (cols.ticket_id.clone(), CellValue::Text(r.ticket_id.clone())),
                (cols.project.clone(), CellValue::Text(r.project.clone())),
                (cols.description.clone(), rel.name.clone()),
                (
                    cols.content.clone(),
                    text_or_empty(r.descriptions.join(TEXT_DELIMITER)),
                ),
                (cols.created_on.clone(), rel.created_on.clone()),
                (cols.requester.clone(), rel.requester.clone()),
                (cols.value.clone(), CellValue::Number(r.value)),
                (cols.approver.clone(), rel.approver.clone()),
                (cols.received_on.clone(), rel.received_on.clone()),
                (
                    cols.project_name.clone(),
                    r.project_name.clone().unwrap_or(CellValue::Empty),
                ),
            ];
            ManagedReportRow {
                ticket_id: r.ticket_id.clone(),
                project: r.project.clone(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticket: &str, project: &str, descriptions: &[&str], value: f64) -> EnrichedRecord {
        EnrichedRecord {
            ticket_id: ticket.to_string(),
            project: project.to_string(),
            project_name: None,
            materials: vec![],
            descriptions: descriptions.iter().map(|s| s.to_string()).collect(),
            quantities: vec![],
            value,
            reference: format!("S{}", ticket),
            relationship: RelationshipRecord {
                ticket_id: ticket.to_string(),
                name: CellValue::Text("Pump replacement".to_string()),
                created_on: CellValue::Date(45000.0),
                requester: CellValue::Text("ANA".to_string()),
                approver: CellValue::Empty,
                received_on: CellValue::Empty,
                status: CellValue::Text("Approved".to_string()),
            },
        }
    }

    #[test]
    fn consolidate_merges_same_key() {
        let merged = consolidate(vec![
            record("1", "LCP-1", &["Valve", "Pipe"], 10.0),
            record("2", "LCP-1", &["Other"], 1.0),
            record("1", "LCP-1", &["Pipe", "Flange"], 99.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].descriptions, vec!["Valve", "Pipe", "Flange"]);
        assert_eq!(merged[0].value, 10.0);
    }

    #[test]
    fn renames_to_report_columns() {
        let cols = ReportColumns::default();
        let rows = to_report_rows(&[record("100234", "LCP-9", &["Valve", "Pipe"], 1500.0)], &cols);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("SC"), Some(&CellValue::Text("100234".to_string())));
        assert_eq!(row.get("WBS"), Some(&CellValue::Text("LCP-9".to_string())));
        assert_eq!(row.get("VALOR"), Some(&CellValue::Number(1500.0)));
        assert_eq!(
            row.get("CONTEÚDO"),
            Some(&CellValue::Text("Valve;\nPipe".to_string()))
        );
        assert_eq!(row.get("DATA CRIAÇÃO"), Some(&CellValue::Date(45000.0)));
        assert_eq!(row.get("PROJETO"), Some(&CellValue::Empty));
        assert_eq!(row.values.len(), cols.managed().len());
        // The approval status is not a managed column.
        assert!(row.values.iter().all(|(_, v)| *v != CellValue::Text("Approved".to_string())));
    }
}
