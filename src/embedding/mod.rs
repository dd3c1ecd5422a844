//! Text embedding capability.
//!
//! Every embedder carries a version stamp. The stamp is persisted next to the
//! index so a store built by one embedding source is never queried with
//! another.

mod hashed;
mod onnx;

pub use hashed::HashedEmbedder;
pub use onnx::EmbeddingEngine;

use crate::errors::Error;

/// Embedding dimensions shared by all embedders (bge-small-en-v1.5 width).
pub const EMBEDDING_DIMS: usize = 384;

/// Deterministic text-to-vector function.
///
/// Implementations must return the same vector for the same text for as long
/// as `version()` is unchanged.
pub trait Embedder: Send + Sync {
    /// Embed a single text into an `EMBEDDING_DIMS`-long, L2-normalized vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, Error>;

    /// Identifier of the embedding source (model and revision).
    fn version(&self) -> &str;
}

pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// # Errors
///
/// - Returns `Error::MismatchedDimensions` if vectors have different lengths.
/// - Returns `Error::InvalidEmbedding` if either vector is empty or any value is NaN or infinite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, Error> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::InvalidEmbedding(
            "Cannot compute similarity with empty vector".to_string(),
        ));
    }

    if a.len() != b.len() {
        return Err(Error::MismatchedDimensions {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Reject vectors that cannot take part in cosine search.
pub(crate) fn validate_embedding(vec: &[f32]) -> Result<(), Error> {
    if vec.len() != EMBEDDING_DIMS {
        return Err(Error::MismatchedDimensions {
            expected: EMBEDDING_DIMS,
            actual: vec.len(),
        });
    }
    if vec.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidEmbedding(
            "Vector contains NaN or infinite values".to_string(),
        ));
    }
    if vec.iter().all(|&x| x == 0.0) {
        return Err(Error::InvalidEmbedding(
            "Zero vector (text has no embeddable content)".to_string(),
        ));
    }
    Ok(())
}
