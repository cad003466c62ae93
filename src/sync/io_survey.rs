// The vote ledger, stored as a CSV file.

use std::io::{Read, Write};
use std::path::Path;

use procurement_reconcile::survey::{VoteLedger, VoteRecord};

use crate::sync::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct LedgerRow {
    user_name: String,
    #[serde(rename = "projeto")]
    project: String,
    #[serde(rename = "empresa")]
    supplier: String,
    #[serde(rename = "categoria")]
    category: String,
    #[serde(rename = "pergunta_id")]
    question_id: String,
    #[serde(rename = "pergunta_texto")]
    question_text: String,
    #[serde(rename = "voto")]
    vote: String,
}

impl From<LedgerRow> for VoteRecord {
    fn from(r: LedgerRow) -> Self {
        VoteRecord {
            user_name: r.user_name,
            project: r.project,
            supplier: r.supplier,
            category: r.category,
            question_id: r.question_id,
            question_text: r.question_text,
            vote: r.vote,
        }
    }
}

impl From<&VoteRecord> for LedgerRow {
    fn from(r: &VoteRecord) -> Self {
        LedgerRow {
            user_name: r.user_name.clone(),
            project: r.project.clone(),
            supplier: r.supplier.clone(),
            category: r.category.clone(),
            question_id: r.question_id.clone(),
            question_text: r.question_text.clone(),
            vote: r.vote.clone(),
        }
    }
}

pub fn read_ledger<R: Read>(reader: R) -> Result<VoteLedger, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records: Vec<VoteRecord> = Vec::new();
    for row in rdr.deserialize() {
        let row: LedgerRow = row?;
        records.push(row.into());
    }
    Ok(VoteLedger::new(records))
}

pub fn write_ledger<W: Write>(writer: W, ledger: &VoteLedger) -> Result<(), csv::Error> {
    // The header is written even for an empty ledger.
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record([
        "user_name",
        "projeto",
        "empresa",
        "categoria",
        "pergunta_id",
        "pergunta_texto",
        "voto",
    ])?;
    for r in ledger.records.iter() {
        wtr.serialize(LedgerRow::from(r))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads the ledger file. A missing file is an empty ledger.
pub fn read_ledger_file(path: &str) -> SyncResult<VoteLedger> {
    if !Path::new(path).exists() {
        info!("read_ledger_file: {} does not exist yet, starting empty", path);
        return Ok(VoteLedger::default());
    }
    let file = fs::File::open(path).context(OpeningFileSnafu { path })?;
    let ledger = read_ledger(file).context(LedgerSnafu { path })?;
    debug!("read_ledger_file: {} records", ledger.records.len());
    Ok(ledger)
}

pub fn write_ledger_file(path: &str, ledger: &VoteLedger) -> SyncResult<()> {
    let file = fs::File::create(path).context(WritingFileSnafu { path })?;
    write_ledger(file, ledger).context(LedgerSnafu { path })?;
    info!(
        "write_ledger_file: {} records written to {}",
        ledger.records.len(),
        path
    );
    Ok(())
}
