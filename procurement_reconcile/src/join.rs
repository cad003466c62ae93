use log::{debug, info};
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// Keeps the first record of every ticket id, in input order.
pub fn dedup_relationships(records: &[RelationshipRecord]) -> Vec<RelationshipRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let res: Vec<RelationshipRecord> = records
        .iter()
        .filter(|r| seen.insert(r.ticket_id.as_str()))
        .cloned()
        .collect();
    if res.len() < records.len() {
        debug!(
            "dedup_relationships: {} duplicate ticket rows discarded",
            records.len() - res.len()
        );
    }
    res
}

/// Builds the project-code index. The first entry of every code wins.
pub fn dedup_lookup(entries: &[ProjectEntry]) -> HashMap<String, CellValue> {
    let mut index: HashMap<String, CellValue> = HashMap::new();
    for e in entries.iter() {
        index
            .entry(e.code.trim().to_string())
            .or_insert_with(|| e.name.clone());
    }
    index
}

/// Inner join of the requisition groups with the (de-duplicated) tickets.
///
/// Groups whose key has no ticket are dropped. The output keeps the order
/// of the groups. Project codes are trimmed; groups left with an empty
/// project code are dropped as well.
pub fn join_relationships(
    groups: &[AggregatedGroup],
    relationships: &[RelationshipRecord],
) -> Vec<EnrichedRecord> {
    let by_ticket: HashMap<&str, &RelationshipRecord> = relationships
        .iter()
        .map(|r| (r.ticket_id.as_str(), r))
        .collect();
    // A duplicated ticket would multiply the groups.
    debug_assert_eq!(by_ticket.len(), relationships.len());

    let mut res: Vec<EnrichedRecord> = Vec::new();
    for g in groups.iter() {
        let rel = match by_ticket.get(g.key.as_str()) {
            Some(r) => *r,
            None => {
                debug!(
                    "join_relationships: ticket {} (project {}) not in the relationship export",
                    g.key, g.project
                );
                continue;
            }
        };
        let project = g.project.trim().to_string();
        if project.is_empty() || rel.ticket_id.is_empty() {
            continue;
        }
        res.push(EnrichedRecord {
            ticket_id: rel.ticket_id.clone(),
            project,
            project_name: None,
            materials: g.materials.clone(),
            descriptions: g.descriptions.clone(),
            quantities: g.quantities.clone(),
            value: g.value,
            reference: g.reference.clone(),
            relationship: rel.clone(),
        });
    }
    info!(
        "join_relationships: {} of {} groups matched a ticket",
        res.len(),
        groups.len()
    );
    res
}

/// Left join with the project lookup. Returns the number of records whose
/// project code is unknown; those keep an empty project name.
pub fn attach_project_names(records: &mut [EnrichedRecord], lookup: &[ProjectEntry]) -> usize {
    let index = dedup_lookup(lookup);
    let mut unknown = 0usize;
    for r in records.iter_mut() {
        r.project_name = index.get(r.project.as_str()).cloned();
        if r.project_name.is_none() {
            unknown += 1;
        }
    }
    if unknown > 0 {
        info!(
            "attach_project_names: {} records reference an unknown project",
            unknown
        );
    }
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(ticket: &str, name: &str) -> RelationshipRecord {
        RelationshipRecord {
            ticket_id: ticket.to_string(),
            name: CellValue::Text(name.to_string()),
            created_on: CellValue::Empty,
            requester: CellValue::Empty,
            approver: CellValue::Empty,
            received_on: CellValue::Empty,
            status: CellValue::Empty,
        }
    }

    fn group(project: &str, key: &str, value: f64) -> AggregatedGroup {
        AggregatedGroup {
            project: project.to_string(),
            key: key.to_string(),
            materials: vec![],
            descriptions: vec!["Pump".to_string()],
            quantities: vec!["1".to_string()],
            value,
            reference: format!("S{}", key),
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let records = vec![rel("1", "first"), rel("2", "other"), rel("1", "second")];
        let deduped = dedup_relationships(&records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, CellValue::Text("first".to_string()));
    }

    #[test]
    fn dedup_is_idempotent() {
        let records = vec![rel("1", "a"), rel("1", "b"), rel("3", "c"), rel("3", "d")];
        let once = dedup_relationships(&records);
        let twice = dedup_relationships(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn inner_join_drops_unmatched_groups() {
        let groups = vec![group("LCP-1", "10", 1.0), group("LCP-1", "11", 2.0)];
        let rels = dedup_relationships(&[rel("10", "Known"), rel("99", "Unrelated")]);
        let joined = join_relationships(&groups, &rels);
        assert_eq!(joined.len(), 1);
        assert!(joined.len() <= groups.len());
        assert_eq!(joined[0].ticket_id, "10");
        assert_eq!(joined[0].relationship.name, CellValue::Text("Known".to_string()));
    }

    #[test]
    fn left_join_keeps_unknown_projects() {
        let groups = vec![group(" LCP-9 ", "10", 1.0), group("LCP-404", "10", 2.0)];
        let rels = vec![rel("10", "Pump replacement")];
        let mut joined = join_relationships(&groups, &rels);
        let lookup = vec![
            ProjectEntry {
                code: "LCP-9".to_string(),
                name: CellValue::Text("Gateyard Expansion".to_string()),
            },
            ProjectEntry {
                code: "LCP-9".to_string(),
                name: CellValue::Text("Shadowed".to_string()),
            },
        ];
        let unknown = attach_project_names(&mut joined, &lookup);
        assert_eq!(unknown, 1);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].project, "LCP-9");
        assert_eq!(
            joined[0].project_name,
            Some(CellValue::Text("Gateyard Expansion".to_string()))
        );
        assert_eq!(joined[1].project_name, None);
    }
}
