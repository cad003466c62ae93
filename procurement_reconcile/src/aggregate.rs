use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::key::{has_marker, normalize_reference};

/// Separator used when folding multi-line text fields.
pub const TEXT_DELIMITER: &str = ";\n";

#[derive(PartialEq, Debug, Clone)]
pub enum AggregateResult {
    /// Not a single reference document carries the marker: there is nothing
    /// to reconcile and the join must not be attempted.
    NoMarkedReferences,
    Groups {
        groups: Vec<AggregatedGroup>,
        marked_lines: usize,
        dropped_lines: usize,
    },
}

// Accumulates one group. The sets track what the vectors already hold.
struct GroupFold {
    group: AggregatedGroup,
    seen_materials: HashSet<String>,
    seen_descriptions: HashSet<String>,
}

impl GroupFold {
    fn new(project: &str, key: &str, reference: &str) -> GroupFold {
        GroupFold {
            group: AggregatedGroup {
                project: project.to_string(),
                key: key.to_string(),
                materials: Vec::new(),
                descriptions: Vec::new(),
                quantities: Vec::new(),
                value: 0.0,
                reference: reference.to_string(),
            },
            seen_materials: HashSet::new(),
            seen_descriptions: HashSet::new(),
        }
    }

    fn add(&mut self, line: &RequisitionLine) {
        if let Some(m) = &line.material {
            if self.seen_materials.insert(m.clone()) {
                self.group.materials.push(m.clone());
            }
        }
        if let Some(d) = &line.description {
            if self.seen_descriptions.insert(d.clone()) {
                self.group.descriptions.push(d.clone());
            }
        }
        if let Some(q) = &line.quantity {
            self.group.quantities.push(q.clone());
        }
        self.group.value += line.value.unwrap_or(0.0);
    }
}

/// Groups the requisition lines by (project, normalized ticket key).
///
/// Lines without the marker are ignored. Marked lines whose key does not
/// normalize, or that have no project, are dropped. Groups come out in the
/// order their key is first seen.
pub fn aggregate_lines(lines: &[RequisitionLine]) -> AggregateResult {
    let marked: Vec<&RequisitionLine> = lines.iter().filter(|l| has_marker(&l.reference)).collect();
    if marked.is_empty() {
        info!("aggregate_lines: no marked reference in {} lines", lines.len());
        return AggregateResult::NoMarkedReferences;
    }

    let mut folds: Vec<GroupFold> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut dropped_lines = 0usize;
    for line in marked.iter() {
        let key = match normalize_reference(&line.reference) {
            Some(k) => k,
            None => {
                debug!(
                    "aggregate_lines: dropping reference {:?}: no numeric ticket",
                    line.reference
                );
                dropped_lines += 1;
                continue;
            }
        };
        let project = match &line.project {
            Some(p) => p.clone(),
            None => {
                debug!("aggregate_lines: dropping reference {:?}: no project", line.reference);
                dropped_lines += 1;
                continue;
            }
        };
        let pos = *positions
            .entry((project.clone(), key.clone()))
            .or_insert_with(|| {
                folds.push(GroupFold::new(&project, &key, &line.reference));
                folds.len() - 1
            });
        folds[pos].add(line);
    }
    if dropped_lines > 0 {
        warn!(
            "aggregate_lines: {} of {} marked lines dropped",
            dropped_lines,
            marked.len()
        );
    }

    let groups: Vec<AggregatedGroup> = folds.into_iter().map(|f| f.group).collect();
    info!(
        "aggregate_lines: {} marked lines folded into {} groups",
        marked.len() - dropped_lines,
        groups.len()
    );
    AggregateResult::Groups {
        groups,
        marked_lines: marked.len(),
        dropped_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn line(reference: &str, project: &str, desc: &str, qty: &str, value: Option<f64>) -> RequisitionLine {
        RequisitionLine {
            reference: reference.to_string(),
            project: Some(project.to_string()),
            material: Some(format!("M-{}", desc)),
            description: Some(desc.to_string()),
            quantity: Some(qty.to_string()),
            value,
        }
    }

    fn groups(res: AggregateResult) -> Vec<AggregatedGroup> {
        match res {
            AggregateResult::Groups { groups, .. } => groups,
            AggregateResult::NoMarkedReferences => panic!("expected groups"),
        }
    }

    #[test]
    fn no_marked_references() {
        let lines = vec![line("X998", "LCP-1", "Valve", "1", Some(3.0))];
        assert_eq!(aggregate_lines(&lines), AggregateResult::NoMarkedReferences);
        assert_eq!(aggregate_lines(&[]), AggregateResult::NoMarkedReferences);
    }

    #[test]
    fn marked_but_unparseable_is_an_empty_aggregation() {
        let lines = vec![line("SABC", "LCP-1", "Valve", "1", Some(3.0))];
        match aggregate_lines(&lines) {
            AggregateResult::Groups {
                groups,
                marked_lines,
                dropped_lines,
            } => {
                assert!(groups.is_empty());
                assert_eq!(marked_lines, 1);
                assert_eq!(dropped_lines, 1);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn folds_by_project_and_key() {
        let lines = vec![
            line("S100", "LCP-1", "Valve", "2 UN", Some(10.0)),
            line("S0100", "LCP-1", "Valve", "3 UN", Some(5.5)),
            line("S100", "LCP-1", "Gasket", "1 KG", None),
            line("S100", "LCP-2", "Pipe", "4 M", Some(1.0)),
            line("X100", "LCP-1", "Ignored", "9", Some(1000.0)),
        ];
        let gs = groups(aggregate_lines(&lines));
        assert_eq!(gs.len(), 2);
        let g = &gs[0];
        assert_eq!((g.project.as_str(), g.key.as_str()), ("LCP-1", "100"));
        assert_eq!(g.descriptions, vec!["Valve".to_string(), "Gasket".to_string()]);
        assert_eq!(g.quantities.len(), 3);
        assert_eq!(g.quantities.join(TEXT_DELIMITER), "2 UN;\n3 UN;\n1 KG");
        assert!((g.value - 15.5).abs() < 1e-9);
        assert_eq!(g.reference, "S100");
        assert_eq!(gs[1].project, "LCP-2");
    }

    #[test]
    fn lines_without_project_are_dropped() {
        let mut l = line("S5", "LCP-1", "Valve", "1", Some(1.0));
        l.project = None;
        let gs = groups(aggregate_lines(&[l]));
        assert!(gs.is_empty());
    }

    #[test]
    fn reordering_does_not_change_sums_or_fragments() {
        let lines = vec![
            line("S7", "LCP-1", "Valve", "1", Some(1.25)),
            line("S7", "LCP-1", "Pipe", "2", Some(2.5)),
            line("S7", "LCP-1", "Valve", "3", Some(4.0)),
            line("S7", "LCP-1", "Flange", "4", None),
        ];
        let mut reversed = lines.clone();
        reversed.reverse();
        let a = groups(aggregate_lines(&lines)).remove(0);
        let b = groups(aggregate_lines(&reversed)).remove(0);
        assert!((a.value - b.value).abs() < 1e-9);
        let fa: BTreeSet<String> = a.descriptions.iter().cloned().collect();
        let fb: BTreeSet<String> = b.descriptions.iter().cloned().collect();
        assert_eq!(fa, fb);
        let qa: BTreeSet<String> = a.quantities.iter().cloned().collect();
        let qb: BTreeSet<String> = b.quantities.iter().cloned().collect();
        assert_eq!(qa, qb);
    }
}
