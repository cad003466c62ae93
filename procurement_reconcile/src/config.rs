// ********* Tabular data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The content of a single spreadsheet cell, as handed over by the readers.
///
/// Dates are kept as spreadsheet serial numbers so that they can be written
/// back without any loss.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Serial date (days since 1899-12-30).
    Date(f64),
}

impl CellValue {
    /// True for missing cells and for text cells that only hold whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The textual rendering of the cell, or None when the cell is empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(f) | CellValue::Date(f) => Some(render_number(*f)),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    /// The numeric content of the cell. Text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) | CellValue::Date(f) if f.is_finite() => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

/// Renders a number the way a spreadsheet displays it: integral values
/// without a fractional part.
pub fn render_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// A worksheet once the header row has been located.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Table {
        Table { header, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    pub fn require_column(&self, source: &str, name: &str) -> Result<usize, ReconcileError> {
        self.column_index(name)
            .ok_or_else(|| ReconcileError::MissingColumn {
                source: source.to_string(),
                column: name.to_string(),
            })
    }
}

/// Returns the cell at the given position, treating short rows as empty.
pub fn cell_at(row: &[CellValue], idx: Option<usize>) -> CellValue {
    idx.and_then(|i| row.get(i).cloned())
        .unwrap_or(CellValue::Empty)
}

// ********* Pipeline entities ***********

/// One row of the requisition ledger.
#[derive(PartialEq, Debug, Clone)]
pub struct RequisitionLine {
    /// Rendered reference document (empty when the cell was empty).
    pub reference: String,
    pub project: Option<String>,
    pub material: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    /// None when the cell could not be read as a number.
    pub value: Option<f64>,
}

/// One row of the supplier-relationship export, keyed by the canonical ticket id.
#[derive(PartialEq, Debug, Clone)]
pub struct RelationshipRecord {
    pub ticket_id: String,
    pub name: CellValue,
    pub created_on: CellValue,
    pub requester: CellValue,
    pub approver: CellValue,
    pub received_on: CellValue,
    pub status: CellValue,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ProjectEntry {
    pub code: String,
    pub name: CellValue,
}

/// All the requisition lines sharing a (project, ticket key) pair, folded.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregatedGroup {
    pub project: String,
    pub key: String,
    pub materials: Vec<String>,
    pub descriptions: Vec<String>,
    pub quantities: Vec<String>,
    pub value: f64,
    pub reference: String,
}

/// A requisition group matched with its ticket, and the project name if known.
#[derive(PartialEq, Debug, Clone)]
pub struct EnrichedRecord {
    pub ticket_id: String,
    pub project: String,
    pub project_name: Option<CellValue>,
    pub materials: Vec<String>,
    pub descriptions: Vec<String>,
    pub quantities: Vec<String>,
    pub value: f64,
    pub reference: String,
    pub relationship: RelationshipRecord,
}

/// A record in the reporting vocabulary of the master document.
#[derive(PartialEq, Debug, Clone)]
pub struct ManagedReportRow {
    pub ticket_id: String,
    pub project: String,
    /// (external column name, value) for every managed column.
    pub values: Vec<(String, CellValue)>,
}

impl ManagedReportRow {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }
}

/// The three extracts, already read into tables.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReconcileInputs {
    pub requisitions: Table,
    pub relationships: Table,
    pub projects: Table,
}

// ******** Output data structures *********

/// Why a run produced nothing to write.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NoDataReason {
    /// No reference document starts with the marker.
    NoMarkedReferences,
    /// Marked references exist but none has a numeric remainder.
    NoNormalizableKeys,
    /// No requisition group matches a ticket of the relationship export.
    NoJoinMatches,
}

impl Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDataReason::NoMarkedReferences => {
                write!(f, "no reference document carries the ticket marker")
            }
            NoDataReason::NoNormalizableKeys => {
                write!(f, "no marked reference has a numeric ticket number")
            }
            NoDataReason::NoJoinMatches => {
                write!(f, "no requisition matches a ticket of the relationship export")
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PipelineStats {
    pub lines_read: usize,
    pub lines_marked: usize,
    pub lines_dropped: usize,
    pub groups: usize,
    pub relationships: usize,
    pub joined: usize,
    pub unknown_projects: usize,
    pub report_rows: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReconcileReport {
    pub rows: Vec<ManagedReportRow>,
    pub stats: PipelineStats,
}

#[derive(PartialEq, Debug, Clone)]
pub enum ReconcileOutcome {
    NoData(NoDataReason),
    Records(ReconcileReport),
}

/// Structural problems with the inputs. These abort a run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReconcileError {
    /// An extract lacks a column the pipeline needs.
    MissingColumn { source: String, column: String },
    /// The master document lacks one of the two key columns.
    MissingKeyColumn { column: String },
}

impl Error for ReconcileError {}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::MissingColumn { source, column } => {
                write!(f, "column '{}' not found in the {} extract", column, source)
            }
            ReconcileError::MissingKeyColumn { column } => write!(
                f,
                "the master document must have a '{}' column in its header row",
                column
            ),
        }
    }
}

// ********* Configuration **********

// The defaults follow the headers of the production exports.

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RequisitionColumns {
    pub reference: String,
    pub project: String,
    pub material: String,
    pub description: String,
    pub quantity: String,
    pub value: String,
}

impl Default for RequisitionColumns {
    fn default() -> Self {
        RequisitionColumns {
            reference: "Nº doc.de referência".to_string(),
            project: "Definição do projeto".to_string(),
            material: "Material".to_string(),
            description: "Denominação".to_string(),
            quantity: "Quantidade total".to_string(),
            value: "Valor/moed.transação".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RelationshipColumns {
    pub ticket_id: String,
    pub name: String,
    pub created_on: String,
    pub requester: String,
    pub approver: String,
    pub received_on: String,
    pub status: String,
}

impl Default for RelationshipColumns {
    fn default() -> Self {
        RelationshipColumns {
            ticket_id: "SC ID".to_string(),
            name: "SC Name".to_string(),
            created_on: "Created On".to_string(),
            requester: "Requester".to_string(),
            approver: "Next Approver".to_string(),
            received_on: "Received on".to_string(),
            status: "SC Approval status".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LookupColumns {
    pub worksheet: String,
    /// Number of rows above the header row.
    pub header_offset: usize,
    pub project_code: String,
    pub project_name: String,
}

impl Default for LookupColumns {
    fn default() -> Self {
        LookupColumns {
            worksheet: "Capex".to_string(),
            header_offset: 3,
            project_code: "WBS".to_string(),
            project_name: "PROJECT NAME".to_string(),
        }
    }
}

/// Names of the managed columns in the master document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportColumns {
    pub ticket_id: String,
    pub project: String,
    pub description: String,
    pub content: String,
    pub created_on: String,
    pub requester: String,
    pub value: String,
    pub approver: String,
    pub received_on: String,
    pub project_name: String,
}

impl Default for ReportColumns {
    fn default() -> Self {
        ReportColumns {
            ticket_id: "SC".to_string(),
            project: "WBS".to_string(),
            description: "DESCRIÇÃO".to_string(),
            content: "CONTEÚDO".to_string(),
            created_on: "DATA CRIAÇÃO".to_string(),
            requester: "REQUISITANTE".to_string(),
            value: "VALOR".to_string(),
            approver: "PENDENTE COM".to_string(),
            received_on: "RECEBIDA EM".to_string(),
            project_name: "PROJETO".to_string(),
        }
    }
}

impl ReportColumns {
    /// The managed columns, in the order they are written.
    pub fn managed(&self) -> Vec<String> {
        vec![
            self.ticket_id.clone(),
            self.project.clone(),
            self.description.clone(),
            self.content.clone(),
            self.created_on.clone(),
            self.requester.clone(),
            self.value.clone(),
            self.approver.clone(),
            self.received_on.clone(),
            self.project_name.clone(),
        ]
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct PresentationSettings {
    /// ARGB colour of the header background.
    pub header_fill: String,
    /// ARGB colour of the header text.
    pub header_font_color: String,
    pub header_height: f64,
    pub currency_column: String,
    pub currency_format: String,
    pub date_format: String,
    /// Columns whose text wraps inside the cell.
    pub wrap_columns: Vec<String>,
    pub column_widths: Vec<(String, f64)>,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        let widths: [(&str, f64); 14] = [
            ("SC", 15.0),
            ("WBS", 25.0),
            ("PROJETO", 45.0),
            ("DESCRIÇÃO", 45.0),
            ("CONTEÚDO", 50.0),
            ("VALOR", 18.0),
            ("DATA CRIAÇÃO", 18.0),
            ("REQUISITANTE", 25.0),
            ("RECEBIDA EM", 18.0),
            ("PENDENTE COM", 25.0),
            ("STATUS", 15.0),
            ("OK", 10.0),
            ("COMENTARIO", 50.0),
            ("Complemento dos materiais", 50.0),
        ];
        PresentationSettings {
            header_fill: "FF002D62".to_string(),
            header_font_color: "FFFFFFFF".to_string(),
            header_height: 25.0,
            currency_column: "VALOR".to_string(),
            currency_format: "R$ #,##0.00".to_string(),
            date_format: "dd/mm/yyyy".to_string(),
            wrap_columns: vec!["DESCRIÇÃO".to_string(), "CONTEÚDO".to_string()],
            column_widths: widths
                .iter()
                .map(|(name, w)| (name.to_string(), *w))
                .collect(),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReconcileSettings {
    pub requisition: RequisitionColumns,
    pub relationship: RelationshipColumns,
    pub lookup: LookupColumns,
    pub report: ReportColumns,
    pub presentation: PresentationSettings,
}
