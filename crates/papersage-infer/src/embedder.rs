//! Embedding engine trait.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime sentence encoder (requires the `onnx` feature)
//! - `HashingEmbedder`: FNV-1a feature hashing, deterministic and always available

use ndarray::Array1;
use papersage_core::Result;

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// Float32 embedding vector.
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends: text → fixed-length vector.
pub trait EmbedderBackend: Send + Sync {
    /// Name of the loaded model, e.g. `allenai/specter2` or `fnv1a-768`.
    fn model_name(&self) -> &str;

    /// Generate an embedding for a text string.
    fn embed(&self, text: &str) -> Result<EmbeddingResult>;

    /// Generate embeddings for a batch of texts, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}
