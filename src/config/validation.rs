//! Configuration validation logic.

use super::Config;
use crate::errors::Error;
use crate::memory::MAX_SEARCH_LIMIT;

/// Validates a resolved configuration.
pub struct ConfigValidator<'a> {
    config: &'a Config,
}

impl<'a> ConfigValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - `k_retrieve` and `k_keep` are within 1..=10,000 and `k_keep <= k_retrieve`
    /// - `min_similarity` is finite and between 0.0 and 1.0
    /// - `request_timeout_secs` is at least 1
    /// - `zero_context_ceiling` is at most 100
    /// - Paths, model names, and the endpoint are not empty
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_limits()?;
        self.validate_min_similarity()?;
        self.validate_timeout()?;
        self.validate_ceiling()?;
        self.validate_strings()?;
        Ok(())
    }

    fn validate_limits(&self) -> Result<(), Error> {
        let Config {
            k_retrieve, k_keep, ..
        } = *self.config;

        for (name, value) in [("k_retrieve", k_retrieve), ("k_keep", k_keep)] {
            if value == 0 || value > MAX_SEARCH_LIMIT {
                return Err(Error::Config(format!(
                    "Invalid {name}: {value} (must be between 1 and {MAX_SEARCH_LIMIT})"
                )));
            }
        }

        if k_keep > k_retrieve {
            return Err(Error::Config(format!(
                "Invalid k_keep: {k_keep} exceeds k_retrieve ({k_retrieve})"
            )));
        }

        Ok(())
    }

    fn validate_min_similarity(&self) -> Result<(), Error> {
        let min = self.config.min_similarity;
        if !min.is_finite() {
            return Err(Error::Config(
                "Invalid min_similarity: NaN and infinity are not allowed".into(),
            ));
        }

        if !(0.0..=1.0).contains(&min) {
            return Err(Error::Config(format!(
                "Invalid min_similarity: {min} (must be between 0.0 and 1.0)"
            )));
        }

        Ok(())
    }

    fn validate_timeout(&self) -> Result<(), Error> {
        if self.config.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Invalid request_timeout_secs: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_ceiling(&self) -> Result<(), Error> {
        if self.config.zero_context_ceiling > 100 {
            return Err(Error::Config(format!(
                "Invalid zero_context_ceiling: {} (must be at most 100)",
                self.config.zero_context_ceiling
            )));
        }
        Ok(())
    }

    fn validate_strings(&self) -> Result<(), Error> {
        let config = self.config;
        if config.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        for (name, value) in [
            ("Embedding model", &config.embedding_model),
            ("LLM endpoint", &config.llm_endpoint),
            ("LLM model", &config.llm_model),
            ("API key variable name", &config.api_key_env),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} cannot be empty")));
            }
        }

        Ok(())
    }
}
