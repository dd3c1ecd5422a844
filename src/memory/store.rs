//! Core store struct: embedder, published snapshot, and the ingestion writer.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::sqlite::Database;
use crate::types::MemoryRecord;

/// Maximum allowed input length (100,000 characters).
pub const MAX_INPUT_LENGTH: usize = 100_000;
/// Maximum allowed limit for search operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Immutable view of the corpus. Never mutated after publication.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub(crate) records: Vec<Arc<MemoryRecord>>,
}

/// Translation memory combining embedding generation, an in-memory index,
/// and optional SQLite persistence.
///
/// # Concurrency
///
/// Queries load the current `Arc<Snapshot>` from an `ArcSwap` and search it
/// without taking any lock. Ingestion is serialized through `writer` and publishes a
/// complete new snapshot, so a reader sees either the old or the new corpus.
pub struct TranslationMemoryStore {
    pub(crate) embedder: Arc<dyn Embedder>,
    snapshot: ArcSwap<Snapshot>,
    pub(crate) writer: Mutex<Option<Database>>,
}

impl TranslationMemoryStore {
    /// Create an empty store that lives only in memory.
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            writer: Mutex::new(None),
        }
    }

    /// Open a persisted store, loading every record into the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database path contains path traversal sequences (e.g., "../")
    /// - Parent directory cannot be canonicalized
    /// - Database cannot be opened or a stored embedding is corrupt
    /// - The index was built with a different embedder (`EmbeddingVersionMismatch`)
    pub fn open(db_path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, Error> {
        use std::path::Component;

        // Path traversal guard: reject parent directory components (works on all platforms)
        if db_path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(Error::Config(
                "Invalid database path: contains '..' which may escape the intended directory"
                    .to_string(),
            ));
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::canonicalize(parent).map_err(|e| {
                Error::Config(format!(
                    "Invalid database path: parent directory not accessible: {}",
                    e
                ))
            })?;
        }

        let db = Database::open(db_path)?;
        verify_embedding_version(&db, embedder.version())?;

        let records: Vec<Arc<MemoryRecord>> =
            db.load_records()?.into_iter().map(Arc::new).collect();
        tracing::info!(
            records = records.len(),
            embedding_version = embedder.version(),
            path = %db_path.display(),
            "opened translation memory"
        );

        Ok(Self {
            embedder,
            snapshot: ArcSwap::from_pointee(Snapshot { records }),
            writer: Mutex::new(Some(db)),
        })
    }

    /// Version stamp of the embedder used for ingestion and queries.
    pub fn embedding_version(&self) -> &str {
        self.embedder.version()
    }

    /// Number of records in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current published snapshot.
    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Publish a new snapshot. Callers must hold `writer`.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Validate input length (rejects empty and whitespace-only inputs).
    pub(crate) fn validate_input_length(text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let length = text.chars().count();
        if length > MAX_INPUT_LENGTH {
            return Err(Error::InputTooLong {
                max_length: MAX_INPUT_LENGTH,
                actual_length: length,
            });
        }
        Ok(())
    }
}

/// Validate search limit is within acceptable bounds.
pub(crate) fn validate_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// Fail fast when the persisted index was embedded by another source.
fn verify_embedding_version(db: &Database, current: &str) -> Result<(), Error> {
    let stamped = db.embedding_version()?;
    let row_versions = db.record_versions()?;

    let mismatch = stamped
        .into_iter()
        .chain(row_versions)
        .find(|stored| stored != current);

    match mismatch {
        Some(stored) => {
            tracing::error!(stored = %stored, current, "embedding version mismatch");
            Err(Error::EmbeddingVersionMismatch {
                stored,
                current: current.to_string(),
            })
        }
        None => Ok(()),
    }
}
