//! Configuration system for lokal.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;

pub use loader::ConfigFile;

/// Which embedding function builds and queries the translation memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformer model run through ONNX Runtime.
    #[default]
    Onnx,
    /// Offline hashed bag-of-words vectors.
    Hashed,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onnx" => Ok(EmbeddingBackend::Onnx),
            "hashed" => Ok(EmbeddingBackend::Hashed),
            other => Err(Error::Config(format!(
                "Unknown embedding backend '{other}' (expected 'onnx' or 'hashed')"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Onnx => f.write_str("onnx"),
            EmbeddingBackend::Hashed => f.write_str("hashed"),
        }
    }
}

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the SQLite translation memory.
    pub database_path: PathBuf,
    pub embedding_backend: EmbeddingBackend,
    /// HuggingFace embedding model identifier (ONNX backend).
    pub embedding_model: String,
    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,
    /// Base URL of the generative model API.
    pub llm_endpoint: String,
    pub llm_model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    /// Candidates retrieved by text similarity.
    pub k_retrieve: usize,
    /// Context examples kept for the prompt.
    pub k_keep: usize,
    /// Candidates below this similarity are never used as context.
    pub min_similarity: f64,
    /// Highest confidence a translation without context can receive.
    pub zero_context_ceiling: u8,
}

impl Default for Config {
    fn default() -> Self {
        let lokal_dir = paths::default_home();

        Self {
            database_path: lokal_dir.join("memory.db"),
            embedding_backend: EmbeddingBackend::Onnx,
            embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
            model_cache: lokal_dir.join("models"),
            llm_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            llm_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 30,
            k_retrieve: 10,
            k_keep: 3,
            min_similarity: 0.1,
            zero_context_ceiling: 70,
        }
    }
}

impl Config {
    /// Load configuration from the default file location and the environment.
    ///
    /// The file is `$LOKAL_CONFIG` when set, otherwise
    /// `<config dir>/lokal/config.toml`; a missing default file is not an error.
    pub fn load() -> Result<Self, Error> {
        let file = match loader::explicit_config_path()? {
            Some(path) => Some(loader::read_config_file(&path)?),
            None => loader::load_from_path(&paths::default_config_file())?,
        };
        Self::resolve(file)
    }

    /// Load configuration from a specific file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file is missing or malformed, an
    /// environment value cannot be parsed, or validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, Error> {
        let file = loader::read_config_file(path)?;
        Self::resolve(Some(file))
    }

    fn resolve(file: Option<ConfigFile>) -> Result<Self, Error> {
        let mut config = Config::default();
        if let Some(file) = file {
            config.merge_from_file(file);
        }
        overrides::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge values present in a config file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) {
        if let Some(path) = file.database_path {
            self.database_path = paths::expand_tilde_path(&path);
        }
        if let Some(backend) = file.embedding_backend {
            self.embedding_backend = backend;
        }
        if let Some(model) = file.embedding_model {
            self.embedding_model = model;
        }
        if let Some(path) = file.model_cache {
            self.model_cache = paths::expand_tilde_path(&path);
        }
        if let Some(endpoint) = file.llm_endpoint {
            self.llm_endpoint = endpoint;
        }
        if let Some(model) = file.llm_model {
            self.llm_model = model;
        }
        if let Some(name) = file.api_key_env {
            self.api_key_env = name;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(k) = file.k_retrieve {
            self.k_retrieve = k;
        }
        if let Some(k) = file.k_keep {
            self.k_keep = k;
        }
        if let Some(min) = file.min_similarity {
            self.min_similarity = min;
        }
        if let Some(ceiling) = file.zero_context_ceiling {
            self.zero_context_ceiling = ceiling;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        validation::ConfigValidator::new(self).validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the generative model API key from the variable named by `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the variable is unset or blank.
    pub fn api_key(&self) -> Result<String, Error> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(Error::Config(format!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            ))),
        }
    }

    /// Ensure parent directories for database and cache paths exist.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        if self.embedding_backend == EmbeddingBackend::Onnx
            && !self.model_cache.as_os_str().is_empty()
        {
            std::fs::create_dir_all(&self.model_cache).map_err(|e| {
                Error::Config(format!(
                    "Failed to create model cache directory {}: {e}",
                    self.model_cache.display()
                ))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::tests_utils::{ENV_MUTEX, cleanup_env_vars, set_env};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.database_path.ends_with(".lokal/memory.db"));
        assert!(config.model_cache.ends_with(".lokal/models"));
        assert_eq!(config.embedding_backend, EmbeddingBackend::Onnx);
        assert_eq!(config.embedding_model, "BAAI/bge-small-en-v1.5");
        assert_eq!(config.llm_model, "gemini-2.5-flash");
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!((config.k_retrieve, config.k_keep), (10, 3));
        assert_eq!(config.min_similarity, 0.1);
        assert_eq!(config.zero_context_ceiling, 70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path_merges_file_then_env() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                database_path = "/data/memory.db"
                embedding_backend = "hashed"
                llm_model = "gemini-2.5-pro"
                k_retrieve = 20
                k_keep = 5
            "#,
        )
        .unwrap();
        set_env("LOKAL_K_KEEP", "4");

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/memory.db"));
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hashed);
        assert_eq!(config.llm_model, "gemini-2.5-pro");
        assert_eq!(config.k_retrieve, 20);
        assert_eq!(config.k_keep, 4);
        // untouched keys keep defaults
        assert_eq!(config.min_similarity, 0.1);

        cleanup_env_vars();
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        let result = Config::load_from_path(Path::new("/nonexistent/lokal.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_uses_lokal_config_variable() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "zero_context_ceiling = 60\n").unwrap();
        set_env("LOKAL_CONFIG", path.to_str().unwrap());

        let config = Config::load().unwrap();
        assert_eq!(config.zero_context_ceiling, 60);

        cleanup_env_vars();
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "k_retrieve = 2\nk_keep = 3\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_api_key_from_named_variable() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        let config = Config {
            api_key_env: "LOKAL_TEST_API_KEY".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.api_key(), Err(Error::Config(_))));

        set_env("LOKAL_TEST_API_KEY", "  secret ");
        assert_eq!(config.api_key().unwrap(), "secret");

        cleanup_env_vars();
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("ONNX".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Onnx);
        assert_eq!(" hashed ".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Hashed);
        assert!(matches!(
            "word2vec".parse::<EmbeddingBackend>(),
            Err(Error::Config(_))
        ));
        assert_eq!(EmbeddingBackend::Hashed.to_string(), "hashed");
    }

    #[test]
    fn test_ensure_directories_creates_parents() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("nested/memory.db"),
            model_cache: dir.path().join("models"),
            ..Config::default()
        };
        config.ensure_directories().unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert!(dir.path().join("models").is_dir());
    }
}
