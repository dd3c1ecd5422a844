//! Corpus import from CSV files.
//!
//! Expected columns: `source_text`, `translation`, `target_language`,
//! `content_type`, `product_category`, and optionally `brand_notes`. Column
//! order does not matter and extra columns are ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::memory::TranslationMemoryStore;
use crate::types::{ContentType, NewRecord};

#[derive(Debug, Deserialize)]
struct CsvRow {
    source_text: Option<String>,
    translation: Option<String>,
    target_language: Option<String>,
    content_type: Option<String>,
    product_category: Option<String>,
    #[serde(default)]
    brand_notes: Option<String>,
}

/// Import statistics for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Data rows read from the file.
    pub total_rows: usize,
    /// Rows skipped because a required column was missing or blank.
    pub malformed_rows: usize,
    /// Rows added to the store.
    pub imported: usize,
    /// Well-formed rows the store rejected (e.g. text that cannot be embedded).
    pub rejected: usize,
    /// Records in the store after the import.
    pub total_records: usize,
}

/// Parse a corpus file into records, skipping malformed rows.
///
/// Returns the records and the number of rows skipped.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file does not exist, or `Error::Csv`
/// if the file itself cannot be read.
pub fn read_corpus(path: &Path) -> Result<(Vec<NewRecord>, usize), Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    let mut malformed = 0;

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let parsed = match row {
            Ok(row) => into_record(row),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                malformed += 1;
                tracing::warn!(line, %reason, "skipping malformed corpus row");
            }
        }
    }

    Ok((records, malformed))
}

fn into_record(row: CsvRow) -> Result<NewRecord, String> {
    fn required(value: Option<String>, column: &str) -> Result<String, String> {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("missing {column}"))
    }

    let mut record = NewRecord::new(
        required(row.source_text, "source_text")?,
        required(row.translation, "translation")?,
        required(row.target_language, "target_language")?,
        ContentType::parse(&required(row.content_type, "content_type")?),
        required(row.product_category, "product_category")?,
    );
    if let Some(notes) = row.brand_notes.filter(|n| !n.trim().is_empty()) {
        record = record.with_brand_notes(notes);
    }
    Ok(record)
}

/// Import a CSV corpus into `store`.
///
/// With `replace`, the store is rebuilt from the file alone; otherwise the
/// rows are appended. Malformed rows and rows that cannot be embedded are
/// skipped with a warning.
pub fn import_csv(
    store: &TranslationMemoryStore,
    path: &Path,
    replace: bool,
) -> Result<ImportStats, Error> {
    let (records, malformed_rows) = read_corpus(path)?;
    let total_rows = records.len() + malformed_rows;

    let ingest = if replace {
        store.reingest(records)?
    } else {
        store.ingest_lenient(records)?
    };

    let stats = ImportStats {
        total_rows,
        malformed_rows,
        imported: ingest.ingested,
        rejected: ingest.skipped,
        total_records: ingest.total,
    };
    tracing::info!(
        path = %path.display(),
        imported = stats.imported,
        malformed = stats.malformed_rows,
        rejected = stats.rejected,
        "imported corpus"
    );
    Ok(stats)
}
