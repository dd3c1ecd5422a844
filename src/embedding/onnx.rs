//! Synchronous ONNX embedding engine for text-to-vector conversion.
//!
//! Uses bge-small-en-v1.5 model (384 dimensions) with mean pooling and L2 normalization.

use std::path::Path;

use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use crate::errors::Error;

use super::{EMBEDDING_DIMS, Embedder, l2_normalize};

/// ONNX embedding engine for synchronous text-to-vector conversion.
///
/// The session is behind a mutex because inference needs `&mut Session`;
/// the engine itself can be shared across request threads.
pub struct EmbeddingEngine {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
    version: String,
}

impl EmbeddingEngine {
    /// Load model from the cache directory or download on first use.
    ///
    /// Uses `hf_hub::api::sync::Api` with the ureq backend, so loading is
    /// fully blocking. Files are downloaded once into `cache_dir`.
    pub fn new(model_id: &str, cache_dir: &Path) -> Result<Self, Error> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .build()?;
        let repo = api.model(model_id.to_string());

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))?;
        let tokenizer_path = repo.get("tokenizer.json")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: 512,
                ..Default::default()
            }))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        // Check if model requires token_type_ids input
        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        tracing::info!(model = model_id, "loaded ONNX embedding model");

        Ok(EmbeddingEngine {
            session: Mutex::new(session),
            tokenizer,
            requires_token_type_ids,
            version: format!("onnx/{model_id}/{EMBEDDING_DIMS}"),
        })
    }
}

impl Embedder for EmbeddingEngine {
    /// Returns exactly 384-dimensional f32 vector, L2-normalized.
    ///
    /// Empty strings return a zero vector; texts exceeding 512 tokens are
    /// truncated by the tokenizer.
    fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        if text.is_empty() {
            return Ok(vec![0.0f32; EMBEDDING_DIMS]);
        }

        let encoding = self.tokenizer.encode(text, true)?;
        let input_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        if input_ids.is_empty() {
            return Ok(vec![0.0f32; EMBEDDING_DIMS]);
        }

        let seq_len = input_ids.len();

        let input_ids_vec: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let attention_mask_vec: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();

        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], input_ids_vec))?;
        let attention_mask_tensor = Tensor::from_array(([1usize, seq_len], attention_mask_vec))?;

        let mut session = self.session.lock();
        let outputs = if self.requires_token_type_ids {
            let token_type_ids_tensor =
                Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))?;
            session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])?
        } else {
            session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])?
        };

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                Error::Inference(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()?;

        if shape.len() != 3 {
            return Err(Error::Inference(format!(
                "Expected 3D output (batch, seq_len, hidden), got {:?}",
                shape
            )));
        }

        let batch_size = shape[0] as usize;
        let hidden_dim = shape[2] as usize;

        if batch_size != 1 || hidden_dim != EMBEDDING_DIMS {
            return Err(Error::Inference(format!(
                "Unexpected output shape: {:?}, batch=1, hidden={EMBEDDING_DIMS} expected",
                shape
            )));
        }

        let pooled = mean_pool(data, attention_mask, seq_len, hidden_dim);
        Ok(l2_normalize(&pooled))
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Attention-masked mean over the token axis.
fn mean_pool(data: &[f32], attention_mask: &[u32], seq_len: usize, hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];

    for (token_idx, chunk) in data.chunks(hidden_dim).take(seq_len).enumerate() {
        let mask_value = attention_mask.get(token_idx).copied().unwrap_or(0) as f32;
        for (pooled_value, value) in pooled.iter_mut().zip(chunk) {
            *pooled_value += value * mask_value;
        }
    }

    let mask_sum: f32 = attention_mask
        .iter()
        .take(seq_len)
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    for value in pooled.iter_mut() {
        *value /= mask_sum;
    }
    pooled
}
