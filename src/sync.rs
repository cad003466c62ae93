use log::{debug, info, warn};

use procurement_reconcile::survey::*;
use procurement_reconcile::upsert::UpsertPlan;
use procurement_reconcile::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{ReconcileArgs, SurveyArgs, SurveyCommand};
use crate::sync::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_extracts;
pub mod io_master;
pub mod io_survey;

#[derive(Debug, Snafu)]
pub enum SyncError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { worksheet: String, path: String },
    #[snafu(display("Error reading the master workbook {path}: {source}"))]
    OpeningMaster {
        source: umya_spreadsheet::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing the workbook {path}: {source}"))]
    WritingMaster {
        source: umya_spreadsheet::XlsxError,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error in the vote ledger {path}: {source}"))]
    Ledger { source: csv::Error, path: String },
    #[snafu(display("Invalid input: {source}"))]
    InvalidInput { source: ReconcileError },
    #[snafu(display("Evaluation refused: {source}"))]
    Survey { source: SurveyError },
    #[snafu(display("{name} is not allowed to run this command"))]
    NotAdmin { name: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

// ********* Reconciliation ***********

fn row_to_json(row: &ManagedReportRow) -> JSValue {
    let mut m = serde_json::Map::new();
    for (name, value) in row.values.iter() {
        let v = match value {
            CellValue::Empty => JSValue::Null,
            CellValue::Text(s) => json!(s),
            CellValue::Number(f) | CellValue::Date(f) => json!(f),
            CellValue::Bool(b) => json!(b),
        };
        m.insert(name.clone(), v);
    }
    JSValue::Object(m)
}

fn build_summary_js(report: &ReconcileReport, plan: &UpsertPlan) -> JSValue {
    let s = &report.stats;
    json!({
        "stats": {
            "linesRead": s.lines_read,
            "linesMarked": s.lines_marked,
            "linesDropped": s.lines_dropped,
            "groups": s.groups,
            "relationships": s.relationships,
            "joined": s.joined,
            "unknownProjects": s.unknown_projects,
            "reportRows": s.report_rows,
        },
        "upsert": {
            "updatedRows": plan.updated_rows,
            "appendedRows": plan.appended_rows,
            "cellWrites": plan.writes.len(),
            "missingColumns": plan.missing_columns,
        },
        "rows": report.rows.iter().map(row_to_json).collect::<Vec<JSValue>>(),
    })
}

fn read_summary(path: &str) -> SyncResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn write_output(pretty_js: &str, out: &Option<String>) -> SyncResult<()> {
    match out {
        Some(p) if p == "stdout" => {
            println!("{}", pretty_js);
        }
        Some(p) if !p.is_empty() => {
            fs::write(p, pretty_js).context(WritingFileSnafu { path: p.clone() })?;
            info!("write_output: summary written to {}", p);
        }
        _ => {}
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js: &str) -> SyncResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    Ok(())
}

pub fn run_reconcile(args: &ReconcileArgs) -> SyncResult<()> {
    let config = match &args.config {
        Some(p) => read_sync_config(p)?,
        None => SyncConfig::default(),
    };
    let settings = config.settings();

    let inputs = ReconcileInputs {
        requisitions: io_extracts::read_table(
            &args.requisitions,
            config.requisition_worksheet.as_deref(),
            0,
        )?,
        relationships: io_extracts::read_table(
            &args.relationships,
            config.relationship_worksheet.as_deref(),
            0,
        )?,
        projects: io_extracts::read_table(
            &args.projects,
            Some(settings.lookup.worksheet.as_str()),
            settings.lookup.header_offset,
        )?,
    };

    let report = match reconcile(&inputs, &settings).context(InvalidInputSnafu {})? {
        ReconcileOutcome::NoData(reason) => {
            warn!("run_reconcile: nothing to write: {}", reason);
            return Ok(());
        }
        ReconcileOutcome::Records(r) => r,
    };

    let mut book = io_master::open_master(&args.master)?;
    let sheet = io_master::master_sheet(&book);
    let (upsert, presentation) =
        plan_master_update(&sheet, &report, &settings).context(InvalidInputSnafu {})?;
    if upsert.is_empty() {
        info!("run_reconcile: the master workbook is already up to date");
    }
    io_master::apply_upsert(&mut book, &upsert, &settings.presentation.date_format);
    io_master::apply_presentation(&mut book, &presentation);

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| io_common::default_output_path(&args.master));
    io_master::write_master(&book, &out)?;

    let summary_js = build_summary_js(&report, &upsert);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    debug!("run_reconcile: summary: {}", pretty_js);
    write_output(&pretty_js, &args.summary)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }
    Ok(())
}

// ********* Survey ***********

fn require_admin(raw: &str, catalog: &SurveyCatalog) -> SyncResult<String> {
    let name = login_name(raw).unwrap_or_default();
    ensure!(
        !name.is_empty() && is_admin(&name, &catalog.admin_keys),
        NotAdminSnafu { name }
    );
    Ok(name)
}

/// Parses `QUESTION_ID=VALUE` answers. Question ids are unique in a catalog.
fn parse_answers(catalog: &SurveyCatalog, raw: &[String]) -> SyncResult<Answers> {
    let mut res = Answers::new();
    for a in raw.iter() {
        let (id, vote) = match a.split_once('=') {
            Some((id, vote)) => (id.trim(), vote.trim()),
            None => whatever!("Answer {:?} is not of the form QUESTION_ID=VALUE", a),
        };
        let category = catalog
            .categories
            .iter()
            .find(|c| c.questions.iter().any(|q| q.id == id));
        match category {
            Some(c) => {
                res.insert((c.name.clone(), id.to_string()), vote.to_string());
            }
            None => whatever!("Question {} is not in the catalog", id),
        }
    }
    Ok(res)
}

fn print_js(js: &JSValue) -> SyncResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    println!("{}", pretty);
    Ok(())
}

pub fn run_survey(args: &SurveyArgs) -> SyncResult<()> {
    let catalog_config = read_catalog_config(&args.catalog)?;
    let catalog = catalog_config.catalog()?;

    match &args.command {
        SurveyCommand::Record {
            user,
            project,
            supplier,
            answers,
        } => {
            let user = match login_name(user) {
                Some(u) => u,
                None => whatever!("A user name is required"),
            };
            let mut ledger = io_survey::read_ledger_file(&args.ledger)?;
            let answers = parse_answers(&catalog, answers)?;
            let n = ledger
                .record_evaluation(&catalog, &user, project, supplier, &answers)
                .context(SurveySnafu {})?;
            io_survey::write_ledger_file(&args.ledger, &ledger)?;
            println!("{} answers recorded for {} on {}", n, supplier, project);
        }
        SurveyCommand::Delete {
            admin,
            user,
            project,
            supplier,
        } => {
            let admin = require_admin(admin, &catalog)?;
            let mut ledger = io_survey::read_ledger_file(&args.ledger)?;
            let user = login_name(user).unwrap_or_default();
            let removed = ledger.delete_evaluation(&user, project, supplier);
            if removed == 0 {
                warn!(
                    "run_survey: no evaluation of {} on {} by {}",
                    supplier, project, user
                );
            }
            io_survey::write_ledger_file(&args.ledger, &ledger)?;
            info!("run_survey: {} removed {} records", admin, removed);
            println!("{} records removed", removed);
        }
        SurveyCommand::Clear { admin, confirm } => {
            let admin = require_admin(admin, &catalog)?;
            if !confirm {
                whatever!("Clearing the ledger requires --confirm");
            }
            let mut ledger = io_survey::read_ledger_file(&args.ledger)?;
            let n = ledger.records.len();
            ledger.clear();
            io_survey::write_ledger_file(&args.ledger, &ledger)?;
            warn!("run_survey: {} cleared the ledger ({} records)", admin, n);
        }
        SurveyCommand::Report { project } => {
            let ledger = io_survey::read_ledger_file(&args.ledger)?;
            let averages = category_averages(&ledger.records, project.as_deref());
            if averages.is_empty() {
                warn!("run_survey: no scored answer to report");
            }
            print_js(&json!(average_pivot(&averages)))?;
        }
        SurveyCommand::Projects => {
            let ledger = io_survey::read_ledger_file(&args.ledger)?;
            print_js(&json!(projects_evaluated(&ledger.records)))?;
        }
        SurveyCommand::Participation { admin } => {
            require_admin(admin, &catalog)?;
            let ledger = io_survey::read_ledger_file(&args.ledger)?;
            print_js(&json!(participation(&ledger.records)))?;
        }
        SurveyCommand::Rubric => {
            let mut l: Vec<JSValue> = Vec::new();
            for c in catalog.categories.iter() {
                for q in c.questions.iter() {
                    let levels: Vec<JSValue> = catalog
                        .rubric(&c.name, &q.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(score, text)| json!({"score": score, "description": text}))
                        .collect();
                    l.push(json!({
                        "category": c.name,
                        "id": q.id,
                        "question": q.text,
                        "rubric": levels,
                    }));
                }
            }
            print_js(&JSValue::Array(l))?;
        }
        SurveyCommand::Choices { lookup } => {
            let pairs = io_extracts::read_project_pairs(
                lookup,
                &catalog_config.project_worksheets(),
                &LookupColumns::default(),
            )?;
            for choice in project_choices(&pairs, &catalog.project_prefix) {
                println!("{}", choice);
            }
        }
    }
    Ok(())
}
