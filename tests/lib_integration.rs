//! Integration tests testing lokal library API from external crate perspective.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use lokal::errors::Error;
use lokal::import::import_csv;
use lokal::{
    ContentType, ContextSelector, Embedder, GeminiClient, HashedEmbedder, NewRecord,
    PromptComposer, QualityAssessor, TranslationClient, TranslationMemoryStore, TranslationQuery,
    Translator, MAX_INPUT_LENGTH,
};

const CORPUS: &str = "\
source_text,translation,target_language,content_type,product_category,brand_notes
Introducing the new product feature today,Présentation de la nouvelle fonctionnalité produit aujourd'hui,French,marketing,Product A,Keep the tone enthusiastic
Terms and conditions apply,Conditions générales applicables,French,legal,Product A,
Introducing the new product feature today,Presentamos hoy la nueva función del producto,Spanish,marketing,Product A,
Battery lasts all day,Une autonomie d'une journée,French,technical,Product B,
,Ligne sans source,French,marketing,Product A,
";

/// Model stub answering every prompt with the same text.
struct CannedClient(&'static str);

impl TranslationClient for CannedClient {
    fn generate(&self, _prompt: &str) -> Result<String, Error> {
        Ok(self.0.to_string())
    }
}

/// Hashed vectors under another version stamp.
struct OtherEmbedder;

impl Embedder for OtherEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        HashedEmbedder::new().embed(text)
    }

    fn version(&self) -> &str {
        "other-embedder/v1"
    }
}

fn write_corpus(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("translation_memory.csv");
    std::fs::write(&path, CORPUS).expect("Failed to write corpus");
    path
}

fn open_store(path: &Path) -> TranslationMemoryStore {
    TranslationMemoryStore::open(path, Arc::new(HashedEmbedder::new()))
        .expect("Failed to open store")
}

fn product_query() -> TranslationQuery {
    TranslationQuery::new("Introducing the new product feature", "French")
        .with_content_type(ContentType::Marketing)
        .with_product_category("Product A")
}

const MODEL_OUTPUT: &str =
    r#"{"translation": "Présentation de la nouvelle fonctionnalité produit"}"#;

/// Test that an ingested record is its own top match.
#[test]
fn test_ingest_then_query_exact_source_returns_it_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));
    store
        .ingest(vec![
            NewRecord::new("Save changes", "Enregistrer", "French", ContentType::Ui, "Product A"),
            NewRecord::new("Discard draft", "Supprimer le brouillon", "French", ContentType::Ui, "Product A"),
        ])
        .unwrap();

    let results = store.query("Discard draft", 2).unwrap();
    assert_eq!(results[0].record.source_text, "Discard draft");
    assert!(results[0].similarity >= 0.99);
}

/// Test the full pipeline against a CSV-imported memory.
#[test]
fn test_csv_memory_gives_confident_translation() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));
    let stats = import_csv(&store, &write_corpus(&dir), false).unwrap();
    assert_eq!(stats.malformed_rows, 1);
    assert_eq!(stats.imported, 4);

    let translator = Translator::new(Arc::new(store), Arc::new(CannedClient(MODEL_OUTPUT)))
        .with_limits(10, 3)
        .unwrap()
        .with_min_similarity(0.1);
    let report = translator.translate_detailed(&product_query()).unwrap();

    assert_eq!(
        report.result.translation,
        "Présentation de la nouvelle fonctionnalité produit"
    );
    assert!(report.result.matched_context_count >= 1);
    assert!(report.result.confidence_score > 70);
    assert_eq!(report.brand_guidelines_count, 1);
    assert_eq!(report.cost_savings, "99% cost reduction");
}

/// Test the zero-context path on an empty memory.
#[test]
fn test_empty_memory_caps_confidence_and_explains() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));

    let translator = Translator::new(Arc::new(store), Arc::new(CannedClient(MODEL_OUTPUT)));
    let result = translator.translate(&product_query()).unwrap();

    assert_eq!(result.matched_context_count, 0);
    assert!(result.confidence_score <= 70);
    assert!(result.explanation.contains("No historical context"));
}

/// Test that a model that never answers surfaces as TranslationUnavailable.
#[test]
fn test_model_timeout_propagates_as_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let client = GeminiClient::new(&endpoint, "test-model", "key", Duration::from_millis(300));

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));
    import_csv(&store, &write_corpus(&dir), false).unwrap();
    let translator = Translator::new(Arc::new(store), Arc::new(client));

    let started = Instant::now();
    let result = translator.translate(&product_query());
    assert!(matches!(result, Err(Error::TranslationUnavailable(_))));
    assert!(started.elapsed() < Duration::from_secs(10));
    drop(listener);
}

/// Test the selector's language filter and ordering over an imported corpus.
#[test]
fn test_selector_keeps_language_and_similarity_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));
    import_csv(&store, &write_corpus(&dir), false).unwrap();
    let selector = ContextSelector::new(Arc::new(store));

    let context = selector.select(&product_query(), 10, 3).unwrap();
    assert!(!context.is_empty());
    assert!(context.iter().all(|m| m.record.target_language == "French"));
    for pair in context.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }

    let german = TranslationQuery::new("Introducing the new product feature", "German");
    assert!(selector.select(&german, 10, 3).unwrap().is_empty());
}

/// Test prompt determinism and scoring bounds through the public API.
#[test]
fn test_prompt_is_deterministic_and_scores_are_bounded() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("memory.db"));
    import_csv(&store, &write_corpus(&dir), false).unwrap();
    let context = ContextSelector::new(Arc::new(store))
        .select(&product_query(), 10, 3)
        .unwrap();

    let composer = PromptComposer::new();
    assert_eq!(
        composer.compose(&product_query(), &context),
        composer.compose(&product_query(), &context)
    );

    let assessor = QualityAssessor::new();
    let long = "très long ".repeat(100);
    for output in ["", "x", MODEL_OUTPUT, long.as_str()] {
        let score = assessor
            .assess(&product_query(), output, &context)
            .unwrap()
            .confidence_score;
        assert!(score <= 100);
        let zero_shot = assessor
            .assess(&product_query(), output, &[])
            .unwrap()
            .confidence_score;
        assert!(zero_shot <= 70);
    }
}

/// Test that a memory survives reopening and rejects a different embedder.
#[test]
fn test_reopen_keeps_records_and_checks_embedding_version() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("memory.db");
    {
        let store = open_store(&db_path);
        import_csv(&store, &write_corpus(&dir), false).unwrap();
    }

    let store = open_store(&db_path);
    assert_eq!(store.len(), 4);
    assert_eq!(store.stats().languages, vec!["French", "Spanish"]);

    let result = TranslationMemoryStore::open(&db_path, Arc::new(OtherEmbedder));
    assert!(matches!(
        result,
        Err(Error::EmbeddingVersionMismatch { .. })
    ));
}

/// Test that path traversal strings are rejected by TranslationMemoryStore::open().
#[test]
fn test_open_with_path_traversal_returns_error() {
    let result = TranslationMemoryStore::open(
        Path::new("../../../etc/passwd"),
        Arc::new(HashedEmbedder::new()),
    );
    assert!(result.is_err());
}

/// Test that oversized input is rejected before the model is called.
#[test]
fn test_translate_with_oversized_input_returns_error() {
    let store = TranslationMemoryStore::in_memory(Arc::new(HashedEmbedder::new()));
    let translator = Translator::new(Arc::new(store), Arc::new(CannedClient(MODEL_OUTPUT)));

    let query = TranslationQuery::new("a".repeat(MAX_INPUT_LENGTH + 1), "French");
    assert!(matches!(
        translator.translate(&query),
        Err(Error::InputTooLong { .. })
    ));
}

/// Test the round trip with the real ONNX embedder (downloads the model).
#[test]
#[ignore]
fn test_onnx_round_trip() {
    let dir = TempDir::new().unwrap();
    let engine = lokal::EmbeddingEngine::new("BAAI/bge-small-en-v1.5", &dir.path().join("models"))
        .expect("Failed to load model");
    let store = TranslationMemoryStore::in_memory(Arc::new(engine));
    store
        .ingest(vec![NewRecord::new(
            "Introducing the new product feature today",
            "Présentation de la nouvelle fonctionnalité produit aujourd'hui",
            "French",
            ContentType::Marketing,
            "Product A",
        )])
        .unwrap();

    let results = store
        .query("Introducing the new product feature today", 1)
        .unwrap();
    assert!(results[0].similarity >= 0.99);
}
