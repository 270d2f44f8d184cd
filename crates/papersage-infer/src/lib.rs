//! PaperSage Infer — embedding providers and model selection.
//!
//! Provides the `EmbedderBackend` trait. With the `onnx` feature and model
//! files present, `OnnxEmbedder` runs SPECTER2 (768-dim) or MiniLM (384-dim).
//! `HashingEmbedder` (`fnv1a-<dim>`) needs no model files.

pub mod embedder;
pub mod hashing;
pub mod onnx_embedder;

pub use embedder::{EmbedderBackend, EmbeddingResult};
pub use hashing::HashingEmbedder;

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use papersage_core::{Error, ModelConfig, Result};
use tracing::{info, warn};

/// Load the primary model, falling back to the configured fallback.
///
/// A primary failure is logged and recovered from; failure of both models is
/// a fatal `Error::ModelLoad`.
pub fn create_embedder(config: &ModelConfig) -> Result<Arc<dyn EmbedderBackend>> {
    let primary_err = match load_model(&config.primary, config) {
        Ok(embedder) => {
            info!(
                "Embedding model {} loaded (dim={})",
                embedder.model_name(),
                embedder.dimension()
            );
            return Ok(embedder);
        }
        Err(e) => e,
    };
    warn!("Failed to load model {}: {}", config.primary, primary_err);

    let Some(fallback) = config.fallback.as_deref() else {
        return Err(Error::ModelLoad(format!(
            "{} unavailable and no fallback configured: {}",
            config.primary, primary_err
        )));
    };

    match load_model(fallback, config) {
        Ok(embedder) => {
            info!(
                "Using fallback model {} (dim={})",
                embedder.model_name(),
                embedder.dimension()
            );
            Ok(embedder)
        }
        Err(fallback_err) => Err(Error::ModelLoad(format!(
            "primary {} ({}) and fallback {} ({}) both unavailable",
            config.primary, primary_err, fallback, fallback_err
        ))),
    }
}

/// Load a single model by name.
pub fn load_model(name: &str, config: &ModelConfig) -> Result<Arc<dyn EmbedderBackend>> {
    if let Some(dim) = HashingEmbedder::parse_model_name(name) {
        return Ok(Arc::new(HashingEmbedder::new(dim)));
    }
    load_onnx(name, config)
}

/// Directory of a named model: `allenai/specter2` → `<model_dir>/allenai__specter2`.
pub fn model_path(model_dir: &Path, name: &str) -> PathBuf {
    model_dir.join(name.replace('/', "__"))
}

#[cfg(feature = "onnx")]
fn load_onnx(name: &str, config: &ModelConfig) -> Result<Arc<dyn EmbedderBackend>> {
    let dir = model_path(&config.model_dir, name);
    let embedder = OnnxEmbedder::load(name, &dir, &config.compute)?;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(name: &str, _config: &ModelConfig) -> Result<Arc<dyn EmbedderBackend>> {
    Err(Error::ModelLoad(format!(
        "{}: ONNX support not compiled in (enable the `onnx` feature)",
        name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(primary: &str, fallback: Option<&str>) -> (ModelConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            primary: primary.into(),
            fallback: fallback.map(String::from),
            model_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };
        (config, dir)
    }

    #[test]
    fn test_primary_loads() {
        let (config, _dir) = config("fnv1a-768", None);
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "fnv1a-768");
        assert_eq!(embedder.dimension(), 768);
    }

    #[test]
    fn test_missing_primary_uses_fallback() {
        let (config, _dir) = config("allenai/specter2", Some("fnv1a-384"));
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_name(), "fnv1a-384");
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn test_both_missing_is_fatal() {
        let (config, _dir) = config(
            "allenai/specter2",
            Some("sentence-transformers/all-MiniLM-L6-v2"),
        );
        let err = create_embedder(&config).err().unwrap();
        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[test]
    fn test_no_fallback_is_fatal() {
        let (config, _dir) = config("allenai/specter2", None);
        assert!(matches!(create_embedder(&config), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_model_path() {
        let path = model_path(Path::new("/models"), "allenai/specter2");
        assert_eq!(path, PathBuf::from("/models/allenai__specter2"));
    }
}
