//! Environment variable overrides for configuration.

use super::Config;
use super::env_parser::{apply_override, parse_env_path, parse_env_string, parse_env_value};
use crate::errors::Error;

/// Apply every `LOKAL_*` override to `config`.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    apply_override("LOKAL_DATABASE_PATH", &mut config.database_path, parse_env_path)?;
    apply_override(
        "LOKAL_EMBEDDING_BACKEND",
        &mut config.embedding_backend,
        parse_env_value,
    )?;
    apply_override(
        "LOKAL_EMBEDDING_MODEL",
        &mut config.embedding_model,
        parse_env_string,
    )?;
    apply_override("LOKAL_MODEL_CACHE", &mut config.model_cache, parse_env_path)?;
    apply_override("LOKAL_LLM_ENDPOINT", &mut config.llm_endpoint, parse_env_string)?;
    apply_override("LOKAL_LLM_MODEL", &mut config.llm_model, parse_env_string)?;
    apply_override("LOKAL_API_KEY_ENV", &mut config.api_key_env, parse_env_string)?;
    apply_override(
        "LOKAL_REQUEST_TIMEOUT_SECS",
        &mut config.request_timeout_secs,
        parse_env_value,
    )?;
    apply_override("LOKAL_K_RETRIEVE", &mut config.k_retrieve, parse_env_value)?;
    apply_override("LOKAL_K_KEEP", &mut config.k_keep, parse_env_value)?;
    apply_override(
        "LOKAL_MIN_SIMILARITY",
        &mut config.min_similarity,
        parse_env_value,
    )?;
    apply_override(
        "LOKAL_ZERO_CONTEXT_CEILING",
        &mut config.zero_context_ceiling,
        parse_env_value,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::config::tests_utils::{ENV_MUTEX, cleanup_env_vars, set_env};
    use std::path::PathBuf;

    #[test]
    fn test_env_var_overrides_config() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        set_env("LOKAL_DATABASE_PATH", "/custom/path/memory.db");
        set_env("LOKAL_EMBEDDING_BACKEND", "hashed");
        set_env("LOKAL_LLM_MODEL", "env-model");
        set_env("LOKAL_REQUEST_TIMEOUT_SECS", "5");
        set_env("LOKAL_K_RETRIEVE", "15");
        set_env("LOKAL_MIN_SIMILARITY", "0.3");
        set_env("LOKAL_ZERO_CONTEXT_CEILING", "65");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/custom/path/memory.db"));
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hashed);
        assert_eq!(config.llm_model, "env-model");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.k_retrieve, 15);
        assert_eq!(config.min_similarity, 0.3);
        assert_eq!(config.zero_context_ceiling, 65);
        // not set, keeps default
        assert_eq!(config.k_keep, 3);

        cleanup_env_vars();
    }

    #[test]
    fn test_invalid_number_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        set_env("LOKAL_K_KEEP", "three");
        let mut config = Config::default();
        assert!(matches!(
            apply_env_overrides(&mut config),
            Err(Error::Config(_))
        ));

        cleanup_env_vars();
    }

    #[test]
    fn test_empty_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        set_env("LOKAL_DATABASE_PATH", "");
        let mut config = Config::default();
        assert!(matches!(
            apply_env_overrides(&mut config),
            Err(Error::Config(_))
        ));

        cleanup_env_vars();
    }

    #[test]
    fn test_whitespace_env_var_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        cleanup_env_vars();

        set_env("LOKAL_EMBEDDING_MODEL", "   ");
        let mut config = Config::default();
        assert!(matches!(
            apply_env_overrides(&mut config),
            Err(Error::Config(_))
        ));

        cleanup_env_vars();
    }
}
