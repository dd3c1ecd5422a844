//! Translation memory and request data types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Kind of content a translation belongs to.
///
/// Known kinds are matched exhaustively; anything else is kept verbatim
/// (normalized to lowercase) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Marketing,
    Technical,
    Legal,
    Support,
    Ui,
    Other(String),
}

impl ContentType {
    /// Parse a free-text label. Matching is trim + case-insensitive.
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "marketing" => ContentType::Marketing,
            "technical" => ContentType::Technical,
            "legal" => ContentType::Legal,
            "support" => ContentType::Support,
            "ui" => ContentType::Ui,
            _ => ContentType::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Marketing => "marketing",
            ContentType::Technical => "technical",
            ContentType::Legal => "legal",
            ContentType::Support => "support",
            ContentType::Ui => "ui",
            ContentType::Other(label) => label,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ContentType {
    fn from(label: String) -> Self {
        ContentType::parse(&label)
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.as_str().to_string()
    }
}

/// Compare two free-text labels (language, product category) the way the
/// corpus is matched: trimmed and case-insensitive.
pub fn labels_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A corpus row before it has been embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub source_text: String,
    pub translation: String,
    pub target_language: String,
    pub content_type: ContentType,
    pub product_category: String,
    #[serde(default)]
    pub brand_notes: Option<String>,
}

impl NewRecord {
    pub fn new(
        source_text: impl Into<String>,
        translation: impl Into<String>,
        target_language: impl Into<String>,
        content_type: ContentType,
        product_category: impl Into<String>,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            translation: translation.into(),
            target_language: target_language.into(),
            content_type,
            product_category: product_category.into(),
            brand_notes: None,
        }
    }

    pub fn with_brand_notes(mut self, notes: impl Into<String>) -> Self {
        self.brand_notes = Some(notes.into());
        self
    }
}

/// An ingested historical translation. Immutable once ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub id: String,
    pub source_text: String,
    pub translation: String,
    pub target_language: String,
    pub content_type: ContentType,
    pub product_category: String,
    pub brand_notes: Option<String>,
    pub embedding: Vec<f32>,
}

/// A single translation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationQuery {
    pub source_text: String,
    pub target_language: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub product_category: Option<String>,
}

impl TranslationQuery {
    pub fn new(source_text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_language: target_language.into(),
            content_type: None,
            product_category: None,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_product_category(mut self, category: impl Into<String>) -> Self {
        self.product_category = Some(category.into());
        self
    }
}

/// Which optional metadata fields of a record agree with the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataAgreement {
    pub content_type: bool,
    pub product_category: bool,
}

impl MetadataAgreement {
    pub fn between(query: &TranslationQuery, record: &MemoryRecord) -> Self {
        Self {
            content_type: query
                .content_type
                .as_ref()
                .is_some_and(|ct| *ct == record.content_type),
            product_category: query
                .product_category
                .as_deref()
                .is_some_and(|pc| labels_match(pc, &record.product_category)),
        }
    }

    pub fn matched_fields(&self) -> usize {
        usize::from(self.content_type) + usize::from(self.product_category)
    }
}

/// A retrieved record with its similarity to the query text.
#[derive(Debug, Clone)]
pub struct ContextMatch {
    pub record: Arc<MemoryRecord>,
    /// Cosine similarity in [0, 1].
    pub similarity: f64,
    /// Composite selection score (similarity plus metadata credit).
    pub relevance: f64,
    pub agreement: MetadataAgreement,
}

impl ContextMatch {
    /// A raw retrieval hit, before metadata re-ranking.
    pub fn retrieved(record: Arc<MemoryRecord>, similarity: f64) -> Self {
        Self {
            record,
            similarity,
            relevance: similarity,
            agreement: MetadataAgreement::default(),
        }
    }
}

/// Final translation returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub translation: String,
    /// Integer in [0, 100].
    pub confidence_score: u8,
    pub explanation: String,
    pub matched_context_count: usize,
}
