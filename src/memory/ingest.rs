//! Ingestion: embed new records, persist them, publish a new snapshot.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::embedding::validate_embedding;
use crate::errors::Error;
use crate::types::{MemoryRecord, NewRecord};

use super::store::{MAX_INPUT_LENGTH, Snapshot, TranslationMemoryStore};

/// Outcome of a lenient ingestion.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub ingested: usize,
    pub skipped: usize,
    /// Total records in the store after publication.
    pub total: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Failure {
    Abort,
    Skip,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Append,
    Replace,
}

impl TranslationMemoryStore {
    /// Embed and append records, all or nothing.
    ///
    /// Returns the number of records ingested.
    ///
    /// # Errors
    ///
    /// Returns `Error::Ingestion` for the first record whose fields are empty
    /// or whose embedding cannot be computed; nothing is published in that
    /// case. Storage failures are returned unchanged.
    pub fn ingest(&self, records: Vec<NewRecord>) -> Result<usize, Error> {
        let stats = self.ingest_with(records, Failure::Abort, Target::Append)?;
        Ok(stats.ingested)
    }

    /// Embed and append records, skipping (and logging) invalid ones.
    pub fn ingest_lenient(&self, records: Vec<NewRecord>) -> Result<IngestStats, Error> {
        self.ingest_with(records, Failure::Skip, Target::Append)
    }

    /// Replace the whole corpus, skipping (and logging) invalid records.
    pub fn reingest(&self, records: Vec<NewRecord>) -> Result<IngestStats, Error> {
        self.ingest_with(records, Failure::Skip, Target::Replace)
    }

    fn ingest_with(
        &self,
        records: Vec<NewRecord>,
        on_failure: Failure,
        target: Target,
    ) -> Result<IngestStats, Error> {
        let mut writer = self.writer.lock();

        let mut stats = IngestStats::default();
        let mut embedded = Vec::with_capacity(records.len());
        for record in records {
            match self.embed_record(record) {
                Ok(record) => embedded.push(Arc::new(record)),
                Err(err @ Error::Ingestion { .. }) => {
                    if on_failure == Failure::Abort {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, "skipping corpus record");
                    stats.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        stats.ingested = embedded.len();

        if let Some(db) = writer.as_mut() {
            let rows: Vec<MemoryRecord> = embedded.iter().map(|r| (**r).clone()).collect();
            match target {
                Target::Append => db.insert_records(&rows, self.embedder.version())?,
                Target::Replace => db.replace_records(&rows, self.embedder.version())?,
            }
        }

        let mut next = match target {
            Target::Append => self.snapshot().records.clone(),
            Target::Replace => Vec::new(),
        };
        next.extend(embedded);
        stats.total = next.len();
        self.publish(Snapshot { records: next });

        tracing::info!(
            ingested = stats.ingested,
            skipped = stats.skipped,
            total = stats.total,
            "published translation memory snapshot"
        );
        Ok(stats)
    }

    fn embed_record(&self, record: NewRecord) -> Result<MemoryRecord, Error> {
        let source = record.source_text.trim();
        if source.is_empty() {
            return Err(Error::ingestion(&record.source_text, "source_text is empty"));
        }
        if source.chars().count() > MAX_INPUT_LENGTH {
            return Err(Error::ingestion(
                source,
                format!("source_text exceeds {MAX_INPUT_LENGTH} characters"),
            ));
        }
        if record.translation.trim().is_empty() {
            return Err(Error::ingestion(source, "translation is empty"));
        }
        if record.target_language.trim().is_empty() {
            return Err(Error::ingestion(source, "target_language is empty"));
        }

        let embedding = self
            .embedder
            .embed(source)
            .map_err(|e| Error::ingestion(source, format!("embedding failed: {e}")))?;
        validate_embedding(&embedding).map_err(|e| Error::ingestion(source, e.to_string()))?;

        Ok(MemoryRecord {
            id: Uuid::new_v4().to_string(),
            source_text: source.to_string(),
            translation: record.translation.trim().to_string(),
            target_language: record.target_language.trim().to_string(),
            content_type: record.content_type,
            product_category: record.product_category.trim().to_string(),
            brand_notes: record
                .brand_notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            embedding,
        })
    }
}
