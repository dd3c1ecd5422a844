//! Generative model access.
//!
//! The model is an opaque text-completion capability behind the
//! [`TranslationClient`] trait. [`GeminiClient`] talks to the Gemini
//! `generateContent` REST endpoint with a blocking `ureq` agent.

use std::time::Duration;

use serde_json::{Value, json};

use crate::errors::Error;

/// Prompt in, raw model text out.
pub trait TranslationClient: Send + Sync {
    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns `Error::TranslationUnavailable` when the provider fails,
    /// refuses, or does not answer within the configured timeout.
    fn generate(&self, prompt: &str) -> Result<String, Error>;
}

/// Blocking client for the Gemini REST API.
pub struct GeminiClient {
    agent: ureq::Agent,
    url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// # Arguments
    ///
    /// * `endpoint` - API base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    /// * `model` - Model name, e.g. `gemini-2.5-flash`
    /// * `api_key` - Sent as the `x-goog-api-key` header
    /// * `timeout` - Overall deadline for one request, connect included
    pub fn new(endpoint: &str, model: &str, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: format!(
                "{}/models/{}:generateContent",
                endpoint.trim_end_matches('/'),
                model
            ),
            api_key: api_key.into(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TranslationClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, Error> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling model");
        let response = self
            .agent
            .post(&self.url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|e| self.unavailable(e))?;

        let payload: Value = response.into_json().map_err(|e| {
            Error::TranslationUnavailable(format!("unreadable response from {}: {e}", self.model))
        })?;

        candidate_text(&payload).ok_or_else(|| {
            tracing::warn!(model = %self.model, "model returned no candidate text");
            Error::TranslationUnavailable(format!(
                "{} returned no text (blocked or empty)",
                self.model
            ))
        })
    }
}

impl GeminiClient {
    fn unavailable(&self, error: ureq::Error) -> Error {
        let message = match error {
            ureq::Error::Status(429, _) => format!("{} quota exceeded", self.model),
            ureq::Error::Status(404, _) => format!("model {} not available", self.model),
            ureq::Error::Status(code, response) => {
                let detail = response.into_string().unwrap_or_default();
                format!("API error {code}: {}", detail.trim())
            }
            ureq::Error::Transport(transport) => format!("request failed: {transport}"),
        };
        tracing::warn!(model = %self.model, %message, "model call failed");
        Error::TranslationUnavailable(message)
    }
}

/// Concatenated text parts of the first candidate, if any are non-empty.
fn candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() { None } else { Some(text) }
}
