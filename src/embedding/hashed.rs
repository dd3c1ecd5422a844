//! Deterministic hashed bag-of-words embedder.
//!
//! Needs no model download, so it backs offline use and tests. Words are
//! lowercased, split on non-alphanumeric characters and hashed (FNV-1a) into
//! `EMBEDDING_DIMS` buckets; the bucket counts are L2-normalized.

use crate::errors::Error;

use super::{EMBEDDING_DIMS, Embedder, l2_normalize};

const VERSION: &str = "hashed-bow/v1/384";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashed bag-of-words embedder.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashedEmbedder;

impl HashedEmbedder {
    pub fn new() -> Self {
        Self
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

impl Embedder for HashedEmbedder {
    /// Empty or punctuation-only text yields a zero vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        let mut buckets = vec![0.0f32; EMBEDDING_DIMS];
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (fnv1a(word.as_bytes()) % EMBEDDING_DIMS as u64) as usize;
            buckets[bucket] += 1.0;
        }
        if buckets.iter().all(|&x| x == 0.0) {
            return Ok(buckets);
        }
        Ok(l2_normalize(&buckets))
    }

    fn version(&self) -> &str {
        VERSION
    }
}
