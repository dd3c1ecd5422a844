//! lokal - Context-aware translation over a translation memory.
//!
//! A request is translated in four steps: similar past translations are
//! retrieved from the [`TranslationMemoryStore`], the [`ContextSelector`]
//! keeps the ones that fit the target language and metadata, the
//! [`PromptComposer`] renders them into a prompt for a
//! [`TranslationClient`], and the [`QualityAssessor`] scores the output.
//! All operations are synchronous (no async/await required).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lokal::{GeminiClient, HashedEmbedder, TranslationMemoryStore, Translator};
//! use lokal::types::{ContentType, NewRecord, TranslationQuery};
//!
//! let store = TranslationMemoryStore::in_memory(Arc::new(HashedEmbedder::new()));
//! store.ingest(vec![NewRecord::new(
//!     "Introducing the new product feature today",
//!     "Présentation de la nouvelle fonctionnalité produit aujourd'hui",
//!     "French",
//!     ContentType::Marketing,
//!     "Product A",
//! )])?;
//!
//! let client = GeminiClient::new(
//!     "https://generativelanguage.googleapis.com/v1beta",
//!     "gemini-2.5-flash",
//!     std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!     std::time::Duration::from_secs(30),
//! );
//! let translator = Translator::new(Arc::new(store), Arc::new(client));
//!
//! let query = TranslationQuery::new("Introducing the new product feature", "French")
//!     .with_content_type(ContentType::Marketing)
//!     .with_product_category("Product A");
//! let result = translator.translate(&query)?;
//! println!("{} ({}/100)", result.translation, result.confidence_score);
//! # Ok::<(), lokal::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod import;
pub mod memory;
pub mod prompt;
pub mod quality;
pub mod selector;
pub mod service;
pub mod types;
mod sqlite;

// Re-export public API
pub use client::{GeminiClient, TranslationClient};
pub use config::Config;
pub use embedding::{EMBEDDING_DIMS, Embedder, EmbeddingEngine, HashedEmbedder};
pub use errors::Error;
pub use memory::{CorpusStats, IngestStats, MAX_INPUT_LENGTH, MAX_SEARCH_LIMIT, TranslationMemoryStore};
pub use prompt::PromptComposer;
pub use quality::{QualityAssessor, ScoringWeights};
pub use selector::ContextSelector;
pub use service::{TranslationReport, Translator};
pub use types::{ContentType, ContextMatch, NewRecord, TranslationQuery, TranslationResult};
