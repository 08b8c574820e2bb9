// Lead import from comma-separated text.
//
// Column order: name, project, temperature, persona, phone, email, stage, tags.
// The first line is a header and is ignored. Fields are split on every comma
// (quotes do not protect commas) and then stripped of quote characters.

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::model::{LeadId, NewLead, Temperature, DEFAULT_OWNER, DEFAULT_STAGE};
use crate::store::MobiState;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No se pudieron importar los leads. Revisa el formato del archivo.")]
    NoLeads,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub ids: Vec<LeadId>,
}

impl ImportSummary {
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// User-facing confirmation line.
    pub fn message(&self) -> String {
        format!("{} leads importados correctamente.", self.count())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse lead rows from a reader. Rows with fewer than two columns are
/// skipped; the rest always yield a record.
pub fn parse_leads_from_reader<R: Read>(rdr: R) -> Result<Vec<NewLead>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut leads = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let columns: Vec<String> = record.iter().map(clean_field).collect();
        if columns.len() < 2 {
            warn!(row = line + 2, "skipping CSV row with fewer than 2 columns");
            continue;
        }
        leads.push(lead_from_columns(&columns));
    }
    Ok(leads)
}

/// Parse lead rows from in-memory text.
pub fn parse_leads(text: &str) -> Result<Vec<NewLead>, csv::Error> {
    parse_leads_from_reader(text.as_bytes())
}

fn clean_field(raw: &str) -> String {
    raw.trim().replace('"', "")
}

fn lead_from_columns(columns: &[String]) -> NewLead {
    let col = |i: usize| columns.get(i).map(String::as_str).unwrap_or("");
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    let temperature = match Temperature::from_exact_label(col(2)) {
        Some(t) => t,
        None => {
            if !col(2).is_empty() {
                warn!(value = col(2), "unknown temperature in CSV, defaulting to Tibio");
            }
            Temperature::Warm
        }
    };

    let tags = if col(7).is_empty() {
        Vec::new()
    } else {
        col(7).split(';').map(|t| t.trim().to_string()).collect()
    };

    NewLead {
        name: col(0).to_string(),
        project: col(1).to_string(),
        temperature,
        persona: col(3).to_string(),
        job_title: None,
        company: None,
        phone: non_empty(col(4)),
        email: non_empty(col(5)),
        stage: Some(non_empty(col(6)).unwrap_or_else(|| DEFAULT_STAGE.to_string())),
        owner: Some(DEFAULT_OWNER.to_string()),
        tags,
    }
}

// ---------------------------------------------------------------------------
// Import into the store
// ---------------------------------------------------------------------------

/// Parse `text` and add every resulting lead to the store. An import that
/// yields no leads is an error and leaves the store untouched.
pub fn import_leads(store: &mut MobiState, text: &str) -> Result<ImportSummary, ImportError> {
    let leads = parse_leads(text)?;
    if leads.is_empty() {
        warn!("CSV import produced no leads");
        return Err(ImportError::NoLeads);
    }
    let ids = store.add_multiple_leads(leads);
    info!(count = ids.len(), "CSV import complete");
    Ok(ImportSummary { ids })
}

/// Read a CSV file from disk and import it. Bytes that are not UTF-8 (a
/// Windows-1252 spreadsheet export, say) become U+FFFD; only the affected
/// fields change, the rows are still imported.
pub fn import_leads_from_path(store: &mut MobiState, path: &Path) -> Result<ImportSummary, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        warn!(path = %path.display(), "CSV file is not valid UTF-8, invalid bytes replaced");
    }
    import_leads(store, &text)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
