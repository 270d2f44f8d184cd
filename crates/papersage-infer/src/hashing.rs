//! FNV-1a feature hashing embedder.
//!
//! Lexical, not semantic: each lowercase alphanumeric token is hashed into
//! one of `dim` buckets with a hash-derived sign, and the term-frequency
//! vector is L2-normalized. Needs no model files, so it serves as the
//! offline fallback and as the deterministic embedder in tests.

use ndarray::Array1;
use papersage_core::{Error, Result};

use crate::embedder::{EmbedderBackend, EmbeddingResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Model-name prefix that selects this embedder, e.g. `fnv1a-768`.
pub const MODEL_PREFIX: &str = "fnv1a-";

pub struct HashingEmbedder {
    dim: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self {
            dim,
            name: format!("{}{}", MODEL_PREFIX, dim),
        }
    }

    /// Parse `fnv1a-<dim>` into a dimension.
    pub fn parse_model_name(name: &str) -> Option<usize> {
        name.strip_prefix(MODEL_PREFIX)?
            .parse()
            .ok()
            .filter(|&dim| dim > 0)
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

impl EmbedderBackend for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        let mut embedding = Array1::<f32>::zeros(self.dim);
        let mut seen = 0usize;
        for token in Self::tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            seen += 1;
        }
        if seen == 0 {
            return Err(Error::Inference("no tokens to embed".into()));
        }

        let norm = embedding.dot(&embedding).sqrt();
        if norm > 1e-9 {
            embedding /= norm;
        }

        Ok(EmbeddingResult {
            embedding,
            cached: false,
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
