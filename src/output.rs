//! JSON response types and formatting for CLI output.

use serde::Serialize;

use lokal::import::ImportStats;
use lokal::service::TranslationReport;
use lokal::types::ContextMatch;

/// Response for a corpus import.
#[derive(Serialize)]
pub struct IngestResponse {
    pub status: String,
    #[serde(flatten)]
    pub stats: ImportStats,
}

/// Response for a translation.
#[derive(Serialize)]
pub struct TranslateResponse {
    pub translation: String,
    pub confidence_score: u8,
    pub explanation: String,
    pub matched_context_count: usize,
    pub processing_time_ms: u64,
    pub cost_savings: String,
    pub similar_translations_count: usize,
    pub brand_guidelines_count: usize,
}

impl From<TranslationReport> for TranslateResponse {
    fn from(report: TranslationReport) -> Self {
        Self {
            translation: report.result.translation,
            confidence_score: report.result.confidence_score,
            explanation: report.result.explanation,
            matched_context_count: report.result.matched_context_count,
            processing_time_ms: u64::try_from(report.processing_time.as_millis())
                .unwrap_or(u64::MAX),
            cost_savings: report.cost_savings,
            similar_translations_count: report.similar_translations_count,
            brand_guidelines_count: report.brand_guidelines_count,
        }
    }
}

/// Response for a context preview.
#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<ContextItem>,
}

/// One selected past translation.
#[derive(Serialize)]
pub struct ContextItem {
    pub id: String,
    pub source_text: String,
    pub translation: String,
    pub target_language: String,
    pub content_type: String,
    pub product_category: String,
    pub similarity: f64,
    pub relevance: f64,
}

impl From<&ContextMatch> for ContextItem {
    fn from(m: &ContextMatch) -> Self {
        Self {
            id: m.record.id.clone(),
            source_text: m.record.source_text.clone(),
            translation: m.record.translation.clone(),
            target_language: m.record.target_language.clone(),
            content_type: m.record.content_type.to_string(),
            product_category: m.record.product_category.clone(),
            similarity: m.similarity,
            relevance: m.relevance,
        }
    }
}

/// Response for `languages`.
#[derive(Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

/// Response for `content-types`.
#[derive(Serialize)]
pub struct ContentTypesResponse {
    pub content_types: Vec<String>,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}
