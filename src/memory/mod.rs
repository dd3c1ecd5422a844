//! Translation memory store: embedded historical translations with
//! nearest-neighbour lookup.
//!
//! Readers work on an immutable snapshot; ingestion builds a new snapshot
//! and publishes it atomically.

mod ingest;
mod search;
mod stats;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use ingest::IngestStats;
pub use stats::CorpusStats;
pub use stats::MAX_BRAND_GUIDELINES;
pub use store::{MAX_INPUT_LENGTH, MAX_SEARCH_LIMIT, TranslationMemoryStore};
