//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::EmbeddingBackend;
use crate::errors::Error;

/// Configuration loaded from a TOML file. Absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub database_path: Option<PathBuf>,
    pub embedding_backend: Option<EmbeddingBackend>,
    pub embedding_model: Option<String>,
    pub model_cache: Option<PathBuf>,
    pub llm_endpoint: Option<String>,
    pub llm_model: Option<String>,
    pub api_key_env: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub k_retrieve: Option<usize>,
    pub k_keep: Option<usize>,
    pub min_similarity: Option<f64>,
    pub zero_context_ceiling: Option<u8>,
}

/// Path named by `LOKAL_CONFIG`, if set.
pub fn explicit_config_path() -> Result<Option<PathBuf>, Error> {
    match std::env::var("LOKAL_CONFIG") {
        Ok(value) if value.trim().is_empty() => {
            Err(Error::Config("LOKAL_CONFIG cannot be empty".to_string()))
        }
        Ok(value) => Ok(Some(super::paths::expand_tilde_path(Path::new(&value)))),
        Err(_) => Ok(None),
    }
}

/// Load `path` if it exists.
pub fn load_from_path(path: &Path) -> Result<Option<ConfigFile>, Error> {
    if path.exists() {
        read_config_file(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Read and parse a config file that must exist.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {e}", path.display()))
    })
}
