mod config;
use log::{debug, info};

pub use crate::config::*;

pub mod aggregate;
pub mod join;
pub mod key;
pub mod mapping;
pub mod presentation;
pub mod source;
pub mod survey;
pub mod upsert;

use crate::aggregate::AggregateResult;
use crate::presentation::PresentationPlan;
use crate::upsert::{MasterSheet, UpsertPlan};

/// Runs the reconciliation pipeline over the three extracts.
///
/// Arguments:
/// * `inputs` the requisition ledger, the relationship export and the project lookup
/// * `settings` the column names of the extracts and of the master document
///
/// Structural problems (a required column missing) are returned as errors.
/// Runs that have nothing to report return `ReconcileOutcome::NoData`.
pub fn reconcile(
    inputs: &ReconcileInputs,
    settings: &ReconcileSettings,
) -> Result<ReconcileOutcome, ReconcileError> {
    // All the extracts are validated before any data is looked at.
    let lines = source::requisition_lines(&inputs.requisitions, &settings.requisition)?;
    let relationships =
        source::relationship_records(&inputs.relationships, &settings.relationship)?;
    let projects = source::project_entries(&inputs.projects, &settings.lookup)?;

    let mut stats = PipelineStats {
        lines_read: lines.len(),
        ..PipelineStats::default()
    };

    let groups = match aggregate::aggregate_lines(&lines) {
        AggregateResult::NoMarkedReferences => {
            return Ok(ReconcileOutcome::NoData(NoDataReason::NoMarkedReferences))
        }
        AggregateResult::Groups {
            groups,
            marked_lines,
            dropped_lines,
        } => {
            stats.lines_marked = marked_lines;
            stats.lines_dropped = dropped_lines;
            groups
        }
    };
    if groups.is_empty() {
        return Ok(ReconcileOutcome::NoData(NoDataReason::NoNormalizableKeys));
    }
    stats.groups = groups.len();

    let relationships = join::dedup_relationships(&relationships);
    stats.relationships = relationships.len();
    let mut enriched = join::join_relationships(&groups, &relationships);
    if enriched.is_empty() {
        return Ok(ReconcileOutcome::NoData(NoDataReason::NoJoinMatches));
    }
    stats.joined = enriched.len();
    stats.unknown_projects = join::attach_project_names(&mut enriched, &projects);

    let consolidated = mapping::consolidate(enriched);
    let rows = mapping::to_report_rows(&consolidated, &settings.report);
    stats.report_rows = rows.len();
    debug!("reconcile: stats {:?}", stats);
    info!(
        "reconcile: {} requisition lines -> {} report rows",
        stats.lines_read, stats.report_rows
    );
    Ok(ReconcileOutcome::Records(ReconcileReport { rows, stats }))
}

/// Plans both the upsert of the report rows into the master sheet and the
/// formatting of the result.
pub fn plan_master_update(
    sheet: &MasterSheet,
    report: &ReconcileReport,
    settings: &ReconcileSettings,
) -> Result<(UpsertPlan, PresentationPlan), ReconcileError> {
    let upsert = upsert::plan_upsert(sheet, &report.rows, &settings.report)?;
    let presentation =
        presentation::plan_presentation(&sheet.header, &upsert, &settings.presentation);
    Ok((upsert, presentation))
}
