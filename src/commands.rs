//! Command handlers for lokal CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use lokal::config::{Config, EmbeddingBackend};
use lokal::types::{ContentType, TranslationQuery};
use lokal::{
    ContextSelector, Embedder, EmbeddingEngine, Error, GeminiClient, HashedEmbedder,
    QualityAssessor, TranslationMemoryStore, Translator, import,
};

use crate::output::*;

/// Commands supported by lokal CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Import a CSV corpus of past translations
    Ingest {
        /// CSV file with source_text, translation, target_language, content_type, product_category
        file: PathBuf,

        /// Replace the whole memory instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Translate text using the translation memory as context
    Translate {
        /// Text to translate
        text: String,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Show the context that would be used for a translation, without calling the model
    Search {
        /// Text to find context for
        text: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Maximum number of context examples (default: k_keep)
        #[arg(short = 'l', long)]
        limit: Option<usize>,
    },
    /// Show corpus statistics
    Stats,
    /// List target languages in the memory
    Languages,
    /// List content types in the memory
    ContentTypes,
    Version,
}

/// Target language and optional metadata of a query.
#[derive(clap::Args)]
pub struct TargetArgs {
    /// Target language, e.g. "French"
    #[arg(short = 't', long = "to")]
    pub language: String,

    /// Content type (marketing, technical, legal, support, ui, ...)
    #[arg(short = 'c', long)]
    pub content_type: Option<String>,

    /// Product category
    #[arg(short = 'p', long)]
    pub category: Option<String>,
}

impl TargetArgs {
    fn query(&self, text: &str) -> TranslationQuery {
        let mut query = TranslationQuery::new(text, self.language.trim());
        if let Some(content_type) = &self.content_type {
            query = query.with_content_type(ContentType::parse(content_type));
        }
        if let Some(category) = &self.category {
            query = query.with_product_category(category.trim());
        }
        query
    }
}

/// Execute a CLI command.
pub fn execute(command: &Commands, config: &Config, json: bool) -> Result<ExitCode, Error> {
    if let Commands::Version = command {
        return handle_version(json);
    }

    let store = Arc::new(open_store(config)?);
    match command {
        Commands::Ingest { file, replace } => handle_ingest(&store, file, *replace, json),
        Commands::Translate { text, target } => handle_translate(store, config, &target.query(text), json),
        Commands::Search {
            text,
            target,
            limit,
        } => handle_search(store, config, &target.query(text), *limit, json),
        Commands::Stats => handle_stats(&store, json),
        Commands::Languages => handle_languages(&store, json),
        Commands::ContentTypes => handle_content_types(&store, json),
        Commands::Version => handle_version(json),
    }
}

/// Build the embedder selected by `embedding_backend`.
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, Error> {
    match config.embedding_backend {
        EmbeddingBackend::Onnx => Ok(Arc::new(EmbeddingEngine::new(
            &config.embedding_model,
            &config.model_cache,
        )?)),
        EmbeddingBackend::Hashed => Ok(Arc::new(HashedEmbedder::new())),
    }
}

fn open_store(config: &Config) -> Result<TranslationMemoryStore, Error> {
    config.ensure_directories()?;
    let embedder = build_embedder(config)?;
    TranslationMemoryStore::open(&config.database_path, embedder)
}

fn handle_ingest(
    store: &TranslationMemoryStore,
    file: &Path,
    replace: bool,
    json: bool,
) -> Result<ExitCode, Error> {
    let stats = import::import_csv(store, file, replace)?;
    if json {
        print_json(&IngestResponse {
            status: "imported".to_string(),
            stats,
        });
    } else {
        println!(
            "Imported {} of {} rows ({} malformed, {} rejected); memory holds {} translations",
            stats.imported, stats.total_rows, stats.malformed_rows, stats.rejected, stats.total_records
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_translate(
    store: Arc<TranslationMemoryStore>,
    config: &Config,
    query: &TranslationQuery,
    json: bool,
) -> Result<ExitCode, Error> {
    let client = GeminiClient::new(
        &config.llm_endpoint,
        &config.llm_model,
        config.api_key()?,
        config.request_timeout(),
    );
    let translator = Translator::new(store, Arc::new(client))
        .with_limits(config.k_retrieve, config.k_keep)?
        .with_min_similarity(config.min_similarity)
        .with_assessor(QualityAssessor::new().with_zero_context_ceiling(config.zero_context_ceiling));

    let report = translator.translate_detailed(query)?;
    if json {
        print_json(&TranslateResponse::from(report));
    } else {
        let result = &report.result;
        println!("{}", result.translation);
        println!();
        println!(
            "Confidence: {}/100 ({} past translations, {} brand guidelines)",
            result.confidence_score, result.matched_context_count, report.brand_guidelines_count
        );
        println!("{}", result.explanation);
        println!(
            "Processed in {:.2}s, {}",
            report.processing_time.as_secs_f64(),
            report.cost_savings
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_search(
    store: Arc<TranslationMemoryStore>,
    config: &Config,
    query: &TranslationQuery,
    limit: Option<usize>,
    json: bool,
) -> Result<ExitCode, Error> {
    let k_keep = limit.unwrap_or(config.k_keep);
    let k_retrieve = config.k_retrieve.max(k_keep);
    let selector = ContextSelector::new(store).with_min_similarity(config.min_similarity);
    let context = selector.select(query, k_retrieve, k_keep)?;

    if json {
        print_json(&SearchResponse {
            results: context.iter().map(ContextItem::from).collect(),
        });
    } else if context.is_empty() {
        println!("No past translations in {} match this text.", query.target_language);
    } else {
        for m in &context {
            println!(
                "[similarity: {:.2}, relevance: {:.2}] {} / {}\n  {}\n  {}\n",
                m.similarity,
                m.relevance,
                m.record.content_type,
                m.record.product_category,
                m.record.source_text,
                m.record.translation
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_stats(store: &TranslationMemoryStore, json: bool) -> Result<ExitCode, Error> {
    let stats = store.stats();
    if json {
        print_json(&stats);
    } else {
        println!("Translations: {}", stats.total_translations);
        println!("Languages: {}", stats.languages.join(", "));
        println!("Content types: {}", stats.content_types.join(", "));
        println!("Product categories: {}", stats.product_categories.join(", "));
        println!("Embedding: {}", store.embedding_version());
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_languages(store: &TranslationMemoryStore, json: bool) -> Result<ExitCode, Error> {
    let languages = store.stats().languages;
    if json {
        print_json(&LanguagesResponse { languages });
    } else {
        for language in languages {
            println!("{language}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_content_types(store: &TranslationMemoryStore, json: bool) -> Result<ExitCode, Error> {
    let content_types = store.stats().content_types;
    if json {
        print_json(&ContentTypesResponse { content_types });
    } else {
        for content_type in content_types {
            println!("{content_type}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hashed_config(dir: &TempDir) -> Config {
        Config {
            database_path: dir.path().join("memory.db"),
            embedding_backend: EmbeddingBackend::Hashed,
            model_cache: dir.path().join("models"),
            ..Config::default()
        }
    }

    #[test]
    fn test_target_args_build_query() {
        let target = TargetArgs {
            language: " French ".to_string(),
            content_type: Some("Marketing".to_string()),
            category: Some("Product A".to_string()),
        };
        let query = target.query("Hello");
        assert_eq!(query.target_language, "French");
        assert_eq!(query.content_type, Some(ContentType::Marketing));
        assert_eq!(query.product_category.as_deref(), Some("Product A"));
    }

    #[test]
    fn test_ingest_then_stats_through_commands() {
        let dir = TempDir::new().unwrap();
        let config = hashed_config(&dir);
        let csv = dir.path().join("corpus.csv");
        std::fs::write(
            &csv,
            "source_text,translation,target_language,content_type,product_category\n\
             Save changes,Enregistrer,French,ui,Product A\n\
             Delete,Löschen,German,ui,Product A\n",
        )
        .unwrap();

        execute(
            &Commands::Ingest {
                file: csv,
                replace: false,
            },
            &config,
            true,
        )
        .unwrap();

        let store = open_store(&config).unwrap();
        assert_eq!(store.stats().languages, vec!["French", "German"]);
        assert!(execute(&Commands::Stats, &config, true).is_ok());
    }

    #[test]
    fn test_search_previews_context_without_model() {
        let dir = TempDir::new().unwrap();
        let config = hashed_config(&dir);
        let store = open_store(&config).unwrap();
        store
            .ingest(vec![lokal::types::NewRecord::new(
                "Save changes",
                "Enregistrer les modifications",
                "French",
                ContentType::Ui,
                "Product A",
            )])
            .unwrap();
        drop(store);

        let command = Commands::Search {
            text: "Save changes".to_string(),
            target: TargetArgs {
                language: "French".to_string(),
                content_type: None,
                category: None,
            },
            limit: Some(2),
        };
        assert!(execute(&command, &config, true).is_ok());
    }

    #[test]
    fn test_translate_without_api_key_fails() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            api_key_env: "LOKAL_UNSET_TEST_KEY".to_string(),
            ..hashed_config(&dir)
        };
        let command = Commands::Translate {
            text: "Hello".to_string(),
            target: TargetArgs {
                language: "French".to_string(),
                content_type: None,
                category: None,
            },
        };
        assert!(matches!(
            execute(&command, &config, true),
            Err(Error::Config(_))
        ));
    }
}
