//! Context selection: retrieve by text similarity, keep by metadata-aware relevance.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::errors::Error;
use crate::memory::TranslationMemoryStore;
use crate::types::{ContextMatch, MetadataAgreement, TranslationQuery, labels_match};

/// Relevance credit for a matching content type.
pub const CONTENT_TYPE_CREDIT: f64 = 0.2;
/// Relevance credit for a matching product category.
pub const PRODUCT_CATEGORY_CREDIT: f64 = 0.3;

/// Picks the past translations worth showing to the model.
pub struct ContextSelector {
    store: Arc<TranslationMemoryStore>,
    min_similarity: f64,
}

impl ContextSelector {
    pub fn new(store: Arc<TranslationMemoryStore>) -> Self {
        Self {
            store,
            min_similarity: 0.0,
        }
    }

    /// Drop candidates whose text similarity is below `min_similarity`.
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn store(&self) -> &TranslationMemoryStore {
        &self.store
    }

    /// Select up to `k_keep` context matches for `query`.
    ///
    /// Retrieves `k_retrieve` candidates by text similarity, drops every
    /// candidate in another target language, then keeps the `k_keep` with the
    /// highest relevance (`similarity + 0.2·content_type + 0.3·category`).
    /// Equal relevance prefers more matching metadata fields, then retrieval
    /// order. The kept matches are returned most-similar first.
    ///
    /// An empty result is not an error: the prompt then runs zero-shot.
    pub fn select(
        &self,
        query: &TranslationQuery,
        k_retrieve: usize,
        k_keep: usize,
    ) -> Result<Vec<ContextMatch>, Error> {
        if k_keep == 0 {
            return Err(Error::InvalidLimit(
                "k_keep must be greater than 0".to_string(),
            ));
        }
        if k_keep > k_retrieve {
            return Err(Error::InvalidLimit(format!(
                "k_keep ({k_keep}) cannot exceed k_retrieve ({k_retrieve})"
            )));
        }

        let candidates = self.store.query(&query.source_text, k_retrieve)?;
        let retrieved = candidates.len();

        let mut ranked: Vec<ContextMatch> = candidates
            .into_iter()
            .filter(|m| labels_match(&m.record.target_language, &query.target_language))
            .filter(|m| m.similarity >= self.min_similarity)
            .map(|mut m| {
                m.agreement = MetadataAgreement::between(query, &m.record);
                m.relevance = relevance(m.similarity, m.agreement);
                m
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.agreement.matched_fields().cmp(&a.agreement.matched_fields()))
        });
        ranked.truncate(k_keep);

        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });

        tracing::debug!(
            retrieved,
            kept = ranked.len(),
            language = %query.target_language,
            "selected translation context"
        );
        Ok(ranked)
    }
}

fn relevance(similarity: f64, agreement: MetadataAgreement) -> f64 {
    let mut score = similarity;
    if agreement.content_type {
        score += CONTENT_TYPE_CREDIT;
    }
    if agreement.product_category {
        score += PRODUCT_CATEGORY_CREDIT;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbedder;
    use crate::types::{ContentType, NewRecord};

    fn selector(records: Vec<NewRecord>) -> ContextSelector {
        let store = TranslationMemoryStore::in_memory(Arc::new(HashedEmbedder::new()));
        store.ingest(records).unwrap();
        ContextSelector::new(Arc::new(store))
    }

    fn marketing_query(text: &str) -> TranslationQuery {
        TranslationQuery::new(text, "French")
            .with_content_type(ContentType::Marketing)
            .with_product_category("Product A")
    }

    #[test]
    fn test_drops_other_languages() {
        let selector = selector(vec![
            NewRecord::new("new product feature", "nueva función", "Spanish", ContentType::Marketing, "Product A"),
            NewRecord::new("new product feature", "neue Funktion", "German", ContentType::Marketing, "Product A"),
        ]);
        let result = selector
            .select(&marketing_query("new product feature"), 10, 3)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_never_returns_foreign_language() {
        let selector = selector(vec![
            NewRecord::new("new product feature", "nouvelle fonction", "french", ContentType::Marketing, "Product A"),
            NewRecord::new("new product feature", "nueva función", "Spanish", ContentType::Marketing, "Product A"),
            NewRecord::new("product feature", "fonction", "French", ContentType::Legal, "Product B"),
        ]);
        let result = selector
            .select(&marketing_query("new product feature"), 10, 3)
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result
            .iter()
            .all(|m| labels_match(&m.record.target_language, "French")));
    }

    #[test]
    fn test_metadata_credit_decides_which_candidates_are_kept() {
        let selector = selector(vec![
            // very similar but wrong content type and category
            NewRecord::new("the new product feature is here", "x", "French", ContentType::Legal, "Product Z"),
            // slightly less similar with full metadata agreement
            NewRecord::new("the new product feature", "y", "French", ContentType::Marketing, "Product A"),
            NewRecord::new("completely unrelated words", "z", "French", ContentType::Marketing, "Product A"),
        ]);

        let result = selector
            .select(&marketing_query("the new product feature is here"), 10, 1)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].record.translation, "y");
        assert_eq!(result[0].agreement.matched_fields(), 2);
        assert!((result[0].relevance - (result[0].similarity + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_kept_matches_are_ordered_by_similarity() {
        let selector = selector(vec![
            NewRecord::new("feature", "a", "French", ContentType::Marketing, "Product A"),
            NewRecord::new("the new product feature", "b", "French", ContentType::Legal, "Product Z"),
            NewRecord::new("new feature", "c", "French", ContentType::Marketing, "Product B"),
        ]);
        let result = selector
            .select(&marketing_query("the new product feature"), 10, 3)
            .unwrap();
        assert_eq!(result.len(), 3);
        for pair in result.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_tie_prefers_more_matching_fields_then_retrieval_order() {
        // identical source texts give identical similarity
        let selector = selector(vec![
            NewRecord::new("launch day", "first", "French", ContentType::Legal, "Product Z"),
            NewRecord::new("launch day", "second", "French", ContentType::Marketing, "Product Z"),
            NewRecord::new("launch day", "third", "French", ContentType::Marketing, "Product Z"),
        ]);
        let query = TranslationQuery::new("launch day", "French").with_content_type(ContentType::Marketing);
        let result = selector.select(&query, 10, 2).unwrap();
        let kept: Vec<_> = result.iter().map(|m| m.record.translation.as_str()).collect();
        assert_eq!(kept, vec!["second", "third"]);
    }

    #[test]
    fn test_min_similarity_filters_weak_candidates() {
        let selector = selector(vec![NewRecord::new(
            "privacy policy",
            "politique de confidentialité",
            "French",
            ContentType::Legal,
            "Product A",
        )])
        .with_min_similarity(0.1);
        let result = selector
            .select(&marketing_query("camera launch event"), 10, 3)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_store_yields_empty_context() {
        let selector = selector(vec![]);
        let result = selector
            .select(&marketing_query("Introducing the new product feature"), 10, 3)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_rejects_invalid_k() {
        let selector = selector(vec![]);
        let query = marketing_query("hello");
        assert!(matches!(selector.select(&query, 3, 0), Err(Error::InvalidLimit(_))));
        assert!(matches!(selector.select(&query, 2, 3), Err(Error::InvalidLimit(_))));
    }
}
