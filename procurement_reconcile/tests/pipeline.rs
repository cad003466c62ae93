use procurement_reconcile::upsert::MasterSheet;
use procurement_reconcile::*;

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn requisitions(rows: Vec<Vec<CellValue>>) -> Table {
    Table::new(
        header(&[
            "Nº doc.de referência",
            "Definição do projeto",
            "Material",
            "Denominação",
            "Quantidade total",
            "Valor/moed.transação",
        ]),
        rows,
    )
}

fn line(reference: &str, project: &str, description: &str, value: f64) -> Vec<CellValue> {
    vec![
        text(reference),
        text(project),
        text("M-1"),
        text(description),
        CellValue::Number(1.0),
        CellValue::Number(value),
    ]
}

fn relationships(rows: Vec<Vec<CellValue>>) -> Table {
    Table::new(
        header(&[
            "SC ID",
            "SC Name",
            "Created On",
            "Requester",
            "Next Approver",
            "Received on",
            "SC Approval status",
        ]),
        rows,
    )
}

fn ticket(id: f64, name: &str) -> Vec<CellValue> {
    vec![
        CellValue::Number(id),
        text(name),
        CellValue::Date(45100.0),
        text("ANA"),
        text("BRUNO"),
        CellValue::Empty,
        text("In approval"),
    ]
}

fn projects() -> Table {
    Table::new(
        header(&["WBS", "PROJECT NAME"]),
        vec![
            vec![text("LCP-9"), text("Gateyard Expansion")],
            vec![text("LCP-1"), text("Warehouse")],
        ],
    )
}

fn inputs() -> ReconcileInputs {
    ReconcileInputs {
        requisitions: requisitions(vec![
            line("S100234", "LCP-9", "Pump", 1000.0),
            line("S100234", "LCP-9", "Seal kit", 500.0),
            line("X998", "LCP-9", "Ignored", 77.0),
            line("S555", "LCP-404", "Cable", 10.0),
            line("S777", "LCP-1", "No ticket", 5.0),
        ]),
        relationships: relationships(vec![
            ticket(100234.0, "Pump replacement"),
            ticket(555.0, "Cabling"),
            ticket(100234.0, "Shadowed duplicate"),
        ]),
        projects: projects(),
    }
}

fn records(outcome: ReconcileOutcome) -> ReconcileReport {
    match outcome {
        ReconcileOutcome::Records(r) => r,
        ReconcileOutcome::NoData(reason) => panic!("unexpected no data: {}", reason),
    }
}

#[test]
fn end_to_end_scenario() {
    let _ = env_logger::builder().is_test(true).try_init();
    let report = records(reconcile(&inputs(), &ReconcileSettings::default()).unwrap());
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.stats.lines_read, 5);
    assert_eq!(report.stats.lines_marked, 4);
    assert_eq!(report.stats.relationships, 2);
    assert_eq!(report.stats.unknown_projects, 1);

    let row = &report.rows[0];
    assert_eq!(row.ticket_id, "100234");
    assert_eq!(row.project, "LCP-9");
    assert_eq!(row.get("PROJETO"), Some(&text("Gateyard Expansion")));
    assert_eq!(row.get("VALOR"), Some(&CellValue::Number(1500.0)));
    assert_eq!(row.get("DESCRIÇÃO"), Some(&text("Pump replacement")));
    assert_eq!(row.get("CONTEÚDO"), Some(&text("Pump;\nSeal kit")));

    // Unknown project: kept, with a blank project name.
    let other = &report.rows[1];
    assert_eq!(other.ticket_id, "555");
    assert_eq!(other.get("PROJETO"), Some(&CellValue::Empty));

    // The wrong marker contributes nothing.
    assert!(report
        .rows
        .iter()
        .all(|r| r.get("VALOR") != Some(&CellValue::Number(77.0))));
}

#[test]
fn padded_project_codes_sum_together() {
    let mut inputs = inputs();
    inputs.requisitions = requisitions(vec![
        line("S100234", "LCP-9", "Pump", 1000.0),
        line("S100234", "LCP-9 ", "Seal kit", 500.0),
    ]);
    let report = records(reconcile(&inputs, &ReconcileSettings::default()).unwrap());
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].get("VALOR"), Some(&CellValue::Number(1500.0)));
    assert_eq!(report.rows[0].get("PROJETO"), Some(&text("Gateyard Expansion")));
}

#[test]
fn no_marked_reference() {
    let mut inputs = inputs();
    inputs.requisitions = requisitions(vec![line("X998", "LCP-9", "Ignored", 1.0)]);
    assert_eq!(
        reconcile(&inputs, &ReconcileSettings::default()).unwrap(),
        ReconcileOutcome::NoData(NoDataReason::NoMarkedReferences)
    );
}

#[test]
fn no_normalizable_key() {
    let mut inputs = inputs();
    inputs.requisitions = requisitions(vec![line("SABC", "LCP-9", "Bad key", 1.0)]);
    assert_eq!(
        reconcile(&inputs, &ReconcileSettings::default()).unwrap(),
        ReconcileOutcome::NoData(NoDataReason::NoNormalizableKeys)
    );
}

#[test]
fn no_join_match() {
    let mut inputs = inputs();
    inputs.relationships = relationships(vec![ticket(1.0, "Unrelated")]);
    assert_eq!(
        reconcile(&inputs, &ReconcileSettings::default()).unwrap(),
        ReconcileOutcome::NoData(NoDataReason::NoJoinMatches)
    );
}

#[test]
fn missing_columns_are_fatal() {
    let mut inputs = inputs();
    inputs.relationships = Table::new(header(&["Ticket"]), vec![]);
    assert_eq!(
        reconcile(&inputs, &ReconcileSettings::default()).unwrap_err(),
        ReconcileError::MissingColumn {
            source: "relationship".to_string(),
            column: "SC ID".to_string()
        }
    );

    let mut inputs = self::inputs();
    inputs.projects = Table::new(header(&["WBS"]), vec![]);
    assert!(matches!(
        reconcile(&inputs, &ReconcileSettings::default()),
        Err(ReconcileError::MissingColumn { .. })
    ));
}

fn master() -> MasterSheet {
    MasterSheet::new(
        header(&[
            "SC",
            "WBS",
            "PROJETO",
            "DESCRIÇÃO",
            "CONTEÚDO",
            "VALOR",
            "DATA CRIAÇÃO",
            "REQUISITANTE",
            "RECEBIDA EM",
            "PENDENTE COM",
            "STATUS",
        ]),
        vec![vec![
            text("100234.0"),
            text("LCP-9"),
            text("Gateyard"),
            text("old"),
            text("old"),
            CellValue::Number(1.0),
            CellValue::Empty,
            CellValue::Empty,
            text("01/01/2024"),
            CellValue::Empty,
            text("chasing the buyer"),
        ]],
    )
}

#[test]
fn upsert_keeps_manual_status() {
    let settings = ReconcileSettings::default();
    let report = records(reconcile(&inputs(), &settings).unwrap());
    let mut sheet = master();
    let (plan, presentation) = plan_master_update(&sheet, &report, &settings).unwrap();
    assert_eq!(plan.updated_rows, vec![2]);
    assert_eq!(plan.appended_rows, vec![3]);
    assert!(plan.missing_columns.is_empty());
    assert!(presentation.cells.iter().all(|c| c.row == 3));

    sheet.apply(&plan);
    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(sheet.value(2, 11), text("chasing the buyer"));
    assert_eq!(sheet.value(2, 6), CellValue::Number(1500.0));
    assert_eq!(sheet.value(2, 3), text("Gateyard Expansion"));
    // The relationship export had no received date: the old one stays.
    assert_eq!(sheet.value(2, 9), text("01/01/2024"));
    assert_eq!(sheet.value(3, 1), text("555"));
    assert_eq!(sheet.value(3, 11), CellValue::Empty);
}

#[test]
fn second_run_changes_nothing() {
    let settings = ReconcileSettings::default();
    let report = records(reconcile(&inputs(), &settings).unwrap());
    let mut sheet = master();
    let (plan, _) = plan_master_update(&sheet, &report, &settings).unwrap();
    sheet.apply(&plan);
    let once = sheet.clone();

    let (plan, presentation) = plan_master_update(&sheet, &report, &settings).unwrap();
    assert!(plan.appended_rows.is_empty());
    assert!(presentation.cells.is_empty());
    sheet.apply(&plan);
    assert_eq!(sheet, once);
}

#[test]
fn master_without_ticket_column() {
    let settings = ReconcileSettings::default();
    let report = records(reconcile(&inputs(), &settings).unwrap());
    let sheet = MasterSheet::new(header(&["WBS", "STATUS"]), vec![]);
    assert_eq!(
        plan_master_update(&sheet, &report, &settings).unwrap_err(),
        ReconcileError::MissingKeyColumn {
            column: "SC".to_string()
        }
    );
}
