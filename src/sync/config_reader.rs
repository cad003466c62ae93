use crate::sync::*;

use procurement_reconcile::survey::{Category, Question, SurveyCatalog};

// ********* Reconciliation settings ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequisitionColumnsConfig {
    #[serde(rename = "reference")]
    pub reference: Option<String>,
    #[serde(rename = "project")]
    pub project: Option<String>,
    #[serde(rename = "material")]
    pub material: Option<String>,
    #[serde(rename = "description")]
    pub description: Option<String>,
    #[serde(rename = "quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "value")]
    pub value: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelationshipColumnsConfig {
    #[serde(rename = "ticketId")]
    pub ticket_id: Option<String>,
    #[serde(rename = "name")]
    pub name: Option<String>,
    #[serde(rename = "createdOn")]
    pub created_on: Option<String>,
    #[serde(rename = "requester")]
    pub requester: Option<String>,
    #[serde(rename = "approver")]
    pub approver: Option<String>,
    #[serde(rename = "receivedOn")]
    pub received_on: Option<String>,
    #[serde(rename = "status")]
    pub status: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectLookupConfig {
    #[serde(rename = "worksheet")]
    pub worksheet: Option<String>,
    #[serde(rename = "headerOffset")]
    pub header_offset: Option<usize>,
    #[serde(rename = "projectCode")]
    pub project_code: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportColumnsConfig {
    #[serde(rename = "ticketId")]
    pub ticket_id: Option<String>,
    #[serde(rename = "project")]
    pub project: Option<String>,
    #[serde(rename = "description")]
    pub description: Option<String>,
    #[serde(rename = "content")]
    pub content: Option<String>,
    #[serde(rename = "createdOn")]
    pub created_on: Option<String>,
    #[serde(rename = "requester")]
    pub requester: Option<String>,
    #[serde(rename = "value")]
    pub value: Option<String>,
    #[serde(rename = "approver")]
    pub approver: Option<String>,
    #[serde(rename = "receivedOn")]
    pub received_on: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ColumnWidthConfig {
    pub column: String,
    pub width: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct PresentationConfig {
    #[serde(rename = "headerFill")]
    pub header_fill: Option<String>,
    #[serde(rename = "headerFontColor")]
    pub header_font_color: Option<String>,
    #[serde(rename = "headerHeight")]
    pub header_height: Option<f64>,
    #[serde(rename = "currencyColumn")]
    pub currency_column: Option<String>,
    #[serde(rename = "currencyFormat")]
    pub currency_format: Option<String>,
    #[serde(rename = "dateFormat")]
    pub date_format: Option<String>,
    #[serde(rename = "wrapColumns")]
    pub wrap_columns: Option<Vec<String>>,
    #[serde(rename = "columnWidths")]
    pub column_widths: Option<Vec<ColumnWidthConfig>>,
}

/// The JSON configuration of a reconciliation run. Every field is optional.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(rename = "requisitionWorksheet")]
    pub requisition_worksheet: Option<String>,
    #[serde(rename = "relationshipWorksheet")]
    pub relationship_worksheet: Option<String>,
    #[serde(rename = "requisitionColumns")]
    pub requisition_columns: Option<RequisitionColumnsConfig>,
    #[serde(rename = "relationshipColumns")]
    pub relationship_columns: Option<RelationshipColumnsConfig>,
    #[serde(rename = "projectLookup")]
    pub project_lookup: Option<ProjectLookupConfig>,
    #[serde(rename = "reportColumns")]
    pub report_columns: Option<ReportColumnsConfig>,
    #[serde(rename = "presentation")]
    pub presentation: Option<PresentationConfig>,
}

fn or_default(v: &Option<String>, default: String) -> String {
    match v {
        Some(s) if !s.trim().is_empty() => s.clone(),
        _ => default,
    }
}

impl SyncConfig {
    /// Fills the library settings, keeping the defaults for what is not configured.
    pub fn settings(&self) -> ReconcileSettings {
        let mut res = ReconcileSettings::default();
        if let Some(c) = &self.requisition_columns {
            let d = res.requisition;
            res.requisition = RequisitionColumns {
                reference: or_default(&c.reference, d.reference),
                project: or_default(&c.project, d.project),
                material: or_default(&c.material, d.material),
                description: or_default(&c.description, d.description),
                quantity: or_default(&c.quantity, d.quantity),
                value: or_default(&c.value, d.value),
            };
        }
        if let Some(c) = &self.relationship_columns {
            let d = res.relationship;
            res.relationship = RelationshipColumns {
                ticket_id: or_default(&c.ticket_id, d.ticket_id),
                name: or_default(&c.name, d.name),
                created_on: or_default(&c.created_on, d.created_on),
                requester: or_default(&c.requester, d.requester),
                approver: or_default(&c.approver, d.approver),
                received_on: or_default(&c.received_on, d.received_on),
                status: or_default(&c.status, d.status),
            };
        }
        if let Some(c) = &self.project_lookup {
            let d = res.lookup;
            res.lookup = LookupColumns {
                worksheet: or_default(&c.worksheet, d.worksheet),
                header_offset: c.header_offset.unwrap_or(d.header_offset),
                project_code: or_default(&c.project_code, d.project_code),
                project_name: or_default(&c.project_name, d.project_name),
            };
        }
        if let Some(c) = &self.report_columns {
            let d = res.report;
            res.report = ReportColumns {
                ticket_id: or_default(&c.ticket_id, d.ticket_id),
                project: or_default(&c.project, d.project),
                description: or_default(&c.description, d.description),
                content: or_default(&c.content, d.content),
                created_on: or_default(&c.created_on, d.created_on),
                requester: or_default(&c.requester, d.requester),
                value: or_default(&c.value, d.value),
                approver: or_default(&c.approver, d.approver),
                received_on: or_default(&c.received_on, d.received_on),
                project_name: or_default(&c.project_name, d.project_name),
            };
        }
        if let Some(c) = &self.presentation {
            let d = res.presentation;
            res.presentation = PresentationSettings {
                header_fill: or_default(&c.header_fill, d.header_fill),
                header_font_color: or_default(&c.header_font_color, d.header_font_color),
                header_height: c.header_height.unwrap_or(d.header_height),
                currency_column: or_default(&c.currency_column, d.currency_column),
                currency_format: or_default(&c.currency_format, d.currency_format),
                date_format: or_default(&c.date_format, d.date_format),
                wrap_columns: c.wrap_columns.clone().unwrap_or(d.wrap_columns),
                column_widths: match &c.column_widths {
                    Some(l) => l.iter().map(|w| (w.column.clone(), w.width)).collect(),
                    None => d.column_widths,
                },
            };
        }
        res
    }
}

pub fn read_sync_config(path: &str) -> SyncResult<SyncConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SyncConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_sync_config: {:?}", config);
    Ok(config)
}

// ********* Survey catalog ***********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub id: String,
    pub text: String,
    pub rubric: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub questions: Vec<QuestionConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWorksheetConfig {
    pub worksheet: String,
    #[serde(rename = "headerOffset")]
    pub header_offset: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyCatalogConfig {
    pub categories: Vec<CategoryConfig>,
    pub suppliers: Vec<String>,
    pub options: Option<Vec<String>>,
    #[serde(rename = "adminKeys")]
    pub admin_keys: Option<Vec<Vec<String>>>,
    #[serde(rename = "projectPrefix")]
    pub project_prefix: Option<String>,
    #[serde(rename = "projectWorksheets")]
    pub project_worksheets: Option<Vec<ProjectWorksheetConfig>>,
}

const RUBRIC_LEVELS: usize = 5;

impl SurveyCatalogConfig {
    pub fn catalog(&self) -> SyncResult<SurveyCatalog> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut categories: Vec<Category> = Vec::new();
        for c in self.categories.iter() {
            let mut questions: Vec<Question> = Vec::new();
            for q in c.questions.iter() {
                if !seen.insert(q.id.as_str()) {
                    whatever!("Question id {} is used more than once in the catalog", q.id);
                }
                let rubric = q.rubric.clone().unwrap_or_default();
                if !rubric.is_empty() && rubric.len() != RUBRIC_LEVELS {
                    whatever!(
                        "The rubric of question {} has {} levels, expected {}",
                        q.id,
                        rubric.len(),
                        RUBRIC_LEVELS
                    );
                }
                questions.push(Question {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    rubric,
                });
            }
            categories.push(Category {
                name: c.name.clone(),
                questions,
            });
        }
        Ok(SurveyCatalog {
            categories,
            suppliers: self.suppliers.clone(),
            options: self
                .options
                .clone()
                .unwrap_or_else(SurveyCatalog::default_options),
            admin_keys: self.admin_keys.clone().unwrap_or_default(),
            project_prefix: self
                .project_prefix
                .clone()
                .unwrap_or_else(|| "LCP".to_string()),
        })
    }

    /// The worksheets listing the projects, with their header offsets.
    pub fn project_worksheets(&self) -> Vec<(String, usize)> {
        match &self.project_worksheets {
            Some(l) => l
                .iter()
                .map(|w| (w.worksheet.clone(), w.header_offset.unwrap_or(0)))
                .collect(),
            None => vec![("Capex".to_string(), 3), ("AME - Quarterly".to_string(), 3)],
        }
    }
}

pub fn read_catalog_config(path: &str) -> SyncResult<SurveyCatalogConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyCatalogConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!(
        "read_catalog_config: {} categories, {} suppliers",
        config.categories.len(),
        config.suppliers.len()
    );
    Ok(config)
}
