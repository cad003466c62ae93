use clap::{Parser, Subcommand};

/// Procurement follow-up tool: reconciles the purchase-requisition extracts into the
/// follow-up workbook, and records supplier evaluations.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merges the three extracts into the master follow-up workbook.
    Reconcile(ReconcileArgs),
    /// Supplier evaluation survey.
    Survey(SurveyArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ReconcileArgs {
    /// (file path) The existing follow-up workbook. Its active worksheet must have a header row.
    #[clap(short, long, value_parser)]
    pub master: String,

    /// (file path) The requisition ledger extract.
    #[clap(long, value_parser)]
    pub requisitions: String,

    /// (file path) The supplier-relationship export (one row per ticket).
    #[clap(long, value_parser)]
    pub relationships: String,

    /// (file path) The project master workbook holding the project lookup worksheet.
    #[clap(long, value_parser)]
    pub projects: String,

    /// (file path, optional) JSON file overriding column names and presentation settings.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) Where to write the updated workbook. Defaults to
    /// `<master>_ATUALIZADA.xlsx` next to the master workbook.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the run will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the tool will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SurveyArgs {
    /// (file path) JSON description of the questions, rubrics, suppliers and admin keys.
    #[clap(long, value_parser)]
    pub catalog: String,

    /// (file path) The CSV file holding the recorded votes. A missing file is an empty ledger.
    #[clap(long, value_parser)]
    pub ledger: String,

    #[clap(subcommand)]
    pub command: SurveyCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SurveyCommand {
    /// Records the evaluation of a supplier on a project.
    Record {
        #[clap(long, value_parser)]
        user: String,
        #[clap(long, value_parser)]
        project: String,
        #[clap(long, value_parser)]
        supplier: String,
        /// QUESTION_ID=VALUE, once per question of the catalog.
        #[clap(long = "answer", value_parser)]
        answers: Vec<String>,
    },
    /// Deletes one evaluation (admin only).
    Delete {
        #[clap(long, value_parser)]
        admin: String,
        #[clap(long, value_parser)]
        user: String,
        #[clap(long, value_parser)]
        project: String,
        #[clap(long, value_parser)]
        supplier: String,
    },
    /// Removes every recorded vote (admin only).
    Clear {
        #[clap(long, value_parser)]
        admin: String,
        #[clap(long, takes_value = false)]
        confirm: bool,
    },
    /// Prints the average score per supplier and category.
    Report {
        #[clap(long, value_parser)]
        project: Option<String>,
    },
    /// Lists the evaluated projects and their suppliers.
    Projects,
    /// Lists who evaluated what (admin only).
    Participation {
        #[clap(long, value_parser)]
        admin: String,
    },
    /// Prints the scoring rubric of every question.
    Rubric,
    /// Lists the projects that can be evaluated, from the project master workbook.
    Choices {
        #[clap(long, value_parser)]
        lookup: String,
    },
}
