//! Configuration: defaults, optional JSON file, `PAPERSAGE_*` environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capabilities::ComputeResources;
use crate::error::{Error, Result};

pub const DEFAULT_COLLECTION: &str = "arxiv_papers";
pub const DEFAULT_EMBEDDING_DIM: usize = 768;
pub const DEFAULT_PRIMARY_MODEL: &str = "allenai/specter2";
pub const DEFAULT_FALLBACK_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_ARXIV_API: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_PORT: u16 = 8000;

/// Which vector index implementation backs the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Process-local, lost on exit.
    #[default]
    Memory,
    /// SQLite file under `<data_dir>/vectordb/`.
    Sqlite,
}

impl FromStr for IndexBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("unknown index backend: {}", other))),
        }
    }
}

/// Bound for an in-process cache. Both `None` means unbounded memoization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CachePolicy {
    pub fn is_unbounded(&self) -> bool {
        self.max_entries.is_none() && self.ttl_secs.is_none()
    }
}

/// Embedding model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model tried first.
    pub primary: String,
    /// Model used when the primary fails to load. `None` disables fallback.
    pub fallback: Option<String>,
    /// Directory holding one sub-directory per ONNX model.
    pub model_dir: PathBuf,
    /// Threads/accelerators handed to the inference session.
    pub compute: ComputeResources,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_MODEL.into(),
            fallback: Some(DEFAULT_FALLBACK_MODEL.into()),
            model_dir: PathBuf::from("data/models"),
            compute: ComputeResources::default(),
        }
    }
}

/// Remote metadata catalog (arXiv API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Extra attempts after the first failed request.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARXIV_API.into(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            user_agent: concat!("papersage/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Top-level PaperSage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSageConfig {
    /// HTTP server port.
    pub port: u16,
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Vector collection name.
    pub collection_name: String,
    /// Expected embedding dimension (768 for SPECTER2).
    pub embedding_dim: usize,
    pub index: IndexBackend,
    pub model: ModelConfig,
    pub catalog: CatalogConfig,
    /// Eviction policy for fetched paper metadata.
    pub metadata_cache: CachePolicy,
    /// When set, smart search always uses this mode instead of escalating.
    pub smart_search_fixed_mode: Option<String>,
    /// Seed the three demo papers at startup.
    pub seed_demo_data: bool,
}

impl Default for PaperSageConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl PaperSageConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            port: DEFAULT_PORT,
            collection_name: DEFAULT_COLLECTION.into(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            index: IndexBackend::default(),
            model: ModelConfig {
                model_dir: data_dir.join("models"),
                ..ModelConfig::default()
            },
            catalog: CatalogConfig::default(),
            metadata_cache: CachePolicy::default(),
            smart_search_fixed_mode: None,
            seed_demo_data: false,
            data_dir,
        }
    }

    /// Directory for the SQLite index.
    pub fn vectordb_dir(&self) -> PathBuf {
        self.data_dir.join("vectordb")
    }

    /// Load a JSON config file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Create configuration from environment and defaults.
    ///
    /// `PAPERSAGE_CONFIG` names an optional JSON file applied before the
    /// individual `PAPERSAGE_*` variables.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = match std::env::var("PAPERSAGE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::with_data_dir(data_dir),
        };
        config.apply_vars(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PAPERSAGE_PORT").or_else(|| lookup("PORT")) {
            self.port = parse_var("PAPERSAGE_PORT", &port)?;
        }
        if let Some(dir) = lookup("PAPERSAGE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("PAPERSAGE_COLLECTION") {
            self.collection_name = name;
        }
        if let Some(dim) = lookup("PAPERSAGE_EMBEDDING_DIM") {
            self.embedding_dim = parse_var("PAPERSAGE_EMBEDDING_DIM", &dim)?;
        }
        if let Some(index) = lookup("PAPERSAGE_INDEX") {
            self.index = index.parse()?;
        }
        if let Some(model) = lookup("PAPERSAGE_PRIMARY_MODEL") {
            self.model.primary = model;
        }
        if let Some(model) = lookup("PAPERSAGE_FALLBACK_MODEL") {
            self.model.fallback = match model.trim() {
                "" | "none" => None,
                name => Some(name.to_string()),
            };
        }
        if let Some(dir) = lookup("PAPERSAGE_MODEL_DIR") {
            self.model.model_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("PAPERSAGE_ARXIV_URL") {
            self.catalog.base_url = url;
        }
        if let Some(retries) = lookup("PAPERSAGE_ARXIV_RETRIES") {
            self.catalog.max_retries = parse_var("PAPERSAGE_ARXIV_RETRIES", &retries)?;
        }
        if let Some(max) = lookup("PAPERSAGE_CACHE_MAX_ENTRIES") {
            self.metadata_cache.max_entries = Some(parse_var("PAPERSAGE_CACHE_MAX_ENTRIES", &max)?);
        }
        if let Some(ttl) = lookup("PAPERSAGE_CACHE_TTL_SECS") {
            self.metadata_cache.ttl_secs = Some(parse_var("PAPERSAGE_CACHE_TTL_SECS", &ttl)?);
        }
        if let Some(mode) = lookup("PAPERSAGE_SMART_MODE") {
            self.smart_search_fixed_mode = match mode.trim() {
                "" | "auto" | "escalate" => None,
                fixed => Some(fixed.to_string()),
            };
        }
        if let Some(seed) = lookup("PAPERSAGE_DEMO_DATA") {
            self.seed_demo_data = matches!(seed.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", name, value)))
}
