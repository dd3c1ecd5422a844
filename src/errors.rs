//! Error types for lokal.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for lokal operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    SQLite(#[from] rusqlite::Error),

    /// ONNX inference error.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input is empty or whitespace-only.
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Input exceeds the maximum allowed length.
    #[error("Input too long: {actual_length} characters (max {max_length})")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },

    /// Search limit out of range.
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// Stored embedding BLOB has the wrong byte length.
    #[error("Invalid BLOB size: expected {expected} bytes, got {actual} bytes")]
    InvalidBlobSize { expected: usize, actual: usize },

    /// Embedding vector has the wrong number of dimensions.
    #[error("Mismatched dimensions: expected {expected} dimensions, got {actual} dimensions")]
    MismatchedDimensions { expected: usize, actual: usize },

    /// Embedding contains NaN/infinite values or is degenerate.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// A corpus record could not be validated or embedded.
    #[error("Ingestion failed for {source_text:?}: {reason}")]
    Ingestion { source_text: String, reason: String },

    /// The persisted index was built by a different embedding source.
    #[error(
        "Embedding version mismatch: index was built with '{stored}', current embedder is '{current}' (re-ingest the corpus)"
    )]
    EmbeddingVersionMismatch { stored: String, current: String },

    /// Model output could not be decoded into a translation.
    #[error("Assessment error: {0}")]
    Assessment(String),

    /// The generative model call failed or timed out.
    #[error("Translation unavailable: {0}")]
    TranslationUnavailable(String),
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TranslationUnavailable(_))
    }

    pub(crate) fn ingestion(source_text: &str, reason: impl Into<String>) -> Self {
        Error::Ingestion {
            source_text: source_text.to_string(),
            reason: reason.into(),
        }
    }
}
