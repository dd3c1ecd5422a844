//! Nearest-neighbour lookup over the published snapshot.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::embedding::cosine_similarity;
use crate::errors::Error;
use crate::types::ContextMatch;

use super::store::{Snapshot, TranslationMemoryStore, validate_limit};

impl TranslationMemoryStore {
    /// Find the records whose source text is most similar to `text`.
    ///
    /// The query is embedded with the store's own embedder, so ingestion and
    /// lookup always share one embedding function.
    ///
    /// # Returns
    ///
    /// Up to `top_k` matches, highest cosine similarity first (ties keep
    /// ingestion order). Similarities are clamped to [0, 1]. An empty store
    /// yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `top_k` is 0 or exceeds `MAX_SEARCH_LIMIT`
    /// - Query is empty or exceeds 100,000 characters
    /// - Embedding generation fails
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<ContextMatch>, Error> {
        validate_limit(top_k)?;

        let text = text.trim();
        Self::validate_input_length(text)?;

        let snapshot = self.snapshot();
        if snapshot.records.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text)?;
        snapshot.nearest(&embedding, top_k)
    }
}

impl Snapshot {
    pub(crate) fn nearest(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ContextMatch>, Error> {
        let mut scored = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let similarity = cosine_similarity(embedding, &record.embedding)?.clamp(0.0, 1.0);
            scored.push(ContextMatch::retrieved(Arc::clone(record), similarity));
        }

        // stable: equal similarities keep ingestion order
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
