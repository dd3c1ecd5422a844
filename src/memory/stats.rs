//! Corpus statistics and brand guideline lookup.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::labels_match;

use super::store::TranslationMemoryStore;

/// Maximum number of brand guidelines returned for one lookup.
pub const MAX_BRAND_GUIDELINES: usize = 10;

/// Summary of what the translation memory contains.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total_translations: usize,
    pub languages: Vec<String>,
    pub content_types: Vec<String>,
    pub product_categories: Vec<String>,
}

impl TranslationMemoryStore {
    /// Unique languages, content types, and categories (sorted) plus the record count.
    pub fn stats(&self) -> CorpusStats {
        let snapshot = self.snapshot();
        let mut languages = BTreeSet::new();
        let mut content_types = BTreeSet::new();
        let mut product_categories = BTreeSet::new();

        for record in &snapshot.records {
            languages.insert(record.target_language.clone());
            content_types.insert(record.content_type.to_string());
            product_categories.insert(record.product_category.clone());
        }

        CorpusStats {
            total_translations: snapshot.records.len(),
            languages: languages.into_iter().collect(),
            content_types: content_types.into_iter().collect(),
            product_categories: product_categories.into_iter().collect(),
        }
    }

    /// Brand notes recorded for a language, narrowed to a product category.
    ///
    /// The category filter applies only when at least one record of that
    /// language carries the category. Notes are unique and keep ingestion
    /// order; at most `MAX_BRAND_GUIDELINES` are returned.
    pub fn brand_guidelines(
        &self,
        target_language: &str,
        product_category: Option<&str>,
    ) -> Vec<String> {
        let snapshot = self.snapshot();
        let in_language: Vec<_> = snapshot
            .records
            .iter()
            .filter(|r| labels_match(&r.target_language, target_language))
            .collect();

        let in_category: Vec<_> = match product_category {
            Some(category) => in_language
                .iter()
                .copied()
                .filter(|r| labels_match(&r.product_category, category))
                .collect(),
            None => Vec::new(),
        };
        let pool = if in_category.is_empty() {
            in_language
        } else {
            in_category
        };

        let mut guidelines: Vec<String> = Vec::new();
        for note in pool.iter().filter_map(|r| r.brand_notes.as_deref()) {
            if guidelines.len() == MAX_BRAND_GUIDELINES {
                break;
            }
            if !guidelines.iter().any(|g| g == note) {
                guidelines.push(note.to_string());
            }
        }
        guidelines
    }
}
