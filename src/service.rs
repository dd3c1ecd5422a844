//! The `translate` pipeline: select context, compose, generate, assess.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::TranslationClient;
use crate::errors::Error;
use crate::memory::{MAX_INPUT_LENGTH, TranslationMemoryStore};
use crate::prompt::PromptComposer;
use crate::quality::QualityAssessor;
use crate::selector::ContextSelector;
use crate::types::{TranslationQuery, TranslationResult};

/// Default number of candidates retrieved by text similarity.
pub const DEFAULT_K_RETRIEVE: usize = 10;
/// Default number of context examples kept for the prompt.
pub const DEFAULT_K_KEEP: usize = 3;

/// Human translation price per word, in dollars.
const HUMAN_COST_PER_WORD: f64 = 0.20;
/// Machine translation price per word, in dollars.
const MACHINE_COST_PER_WORD: f64 = 0.002;

/// A translation plus request-level details for reporting.
#[derive(Debug, Clone)]
pub struct TranslationReport {
    pub result: TranslationResult,
    pub processing_time: Duration,
    pub cost_savings: String,
    pub similar_translations_count: usize,
    pub brand_guidelines_count: usize,
}

/// Context-aware translation service.
///
/// Holds no per-request state: one `Translator` can serve concurrent
/// requests from many threads while the store is re-ingested.
pub struct Translator {
    selector: ContextSelector,
    composer: PromptComposer,
    client: Arc<dyn TranslationClient>,
    assessor: QualityAssessor,
    k_retrieve: usize,
    k_keep: usize,
}

impl Translator {
    pub fn new(store: Arc<TranslationMemoryStore>, client: Arc<dyn TranslationClient>) -> Self {
        Self {
            selector: ContextSelector::new(store),
            composer: PromptComposer::new(),
            client,
            assessor: QualityAssessor::new(),
            k_retrieve: DEFAULT_K_RETRIEVE,
            k_keep: DEFAULT_K_KEEP,
        }
    }

    /// Set retrieval and context sizes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLimit` if `k_keep` is 0 or exceeds `k_retrieve`.
    pub fn with_limits(mut self, k_retrieve: usize, k_keep: usize) -> Result<Self, Error> {
        if k_keep == 0 || k_keep > k_retrieve {
            return Err(Error::InvalidLimit(format!(
                "k_keep ({k_keep}) must be between 1 and k_retrieve ({k_retrieve})"
            )));
        }
        self.k_retrieve = k_retrieve;
        self.k_keep = k_keep;
        Ok(self)
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.selector = self.selector.with_min_similarity(min_similarity);
        self
    }

    pub fn with_assessor(mut self, assessor: QualityAssessor) -> Self {
        self.assessor = assessor;
        self
    }

    pub fn store(&self) -> &TranslationMemoryStore {
        self.selector.store()
    }

    /// Translate one query.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The source text is empty or longer than `MAX_INPUT_LENGTH`
    /// - The target language is empty
    /// - The model call fails or times out (`TranslationUnavailable`)
    /// - The model output cannot be decoded (`Assessment`)
    pub fn translate(&self, query: &TranslationQuery) -> Result<TranslationResult, Error> {
        self.translate_detailed(query).map(|report| report.result)
    }

    /// Translate one query and report timing, savings, and context counts.
    pub fn translate_detailed(&self, query: &TranslationQuery) -> Result<TranslationReport, Error> {
        let started = Instant::now();
        validate_query(query)?;

        let context = self.selector.select(query, self.k_retrieve, self.k_keep)?;
        let guidelines = self
            .store()
            .brand_guidelines(&query.target_language, query.product_category.as_deref());
        let prompt = self
            .composer
            .compose_with_guidelines(query, &context, &guidelines);

        let raw_output = self.client.generate(&prompt)?;
        let result = self.assessor.assess(query, &raw_output, &context)?;

        let processing_time = started.elapsed();
        tracing::info!(
            language = %query.target_language,
            context = context.len(),
            confidence = result.confidence_score,
            elapsed_ms = processing_time.as_millis() as u64,
            "translated"
        );

        Ok(TranslationReport {
            similar_translations_count: context.len(),
            brand_guidelines_count: guidelines.len(),
            cost_savings: cost_savings(&query.source_text),
            processing_time,
            result,
        })
    }
}

fn validate_query(query: &TranslationQuery) -> Result<(), Error> {
    let text = query.source_text.trim();
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }
    let length = text.chars().count();
    if length > MAX_INPUT_LENGTH {
        return Err(Error::InputTooLong {
            max_length: MAX_INPUT_LENGTH,
            actual_length: length,
        });
    }
    if query.target_language.trim().is_empty() {
        return Err(Error::InvalidInput(
            "target language cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Savings of machine over human translation for `text`, as a label.
pub fn cost_savings(text: &str) -> String {
    let words = text.split_whitespace().count();
    if words == 0 {
        return "90%+ cost reduction".to_string();
    }
    let human = words as f64 * HUMAN_COST_PER_WORD;
    let machine = words as f64 * MACHINE_COST_PER_WORD;
    let percent = ((human - machine) / human * 100.0).round();
    format!("{percent:.0}% cost reduction")
}
