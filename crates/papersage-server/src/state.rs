//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use papersage_catalog::{ArxivClient, MetadataFetcher};
use papersage_core::{ComputeResources, Error, IndexBackend, PaperSageConfig, Result};
use papersage_resolve::{PaperSearch, SearchMode, SmartStrategy};
use papersage_store::{MemoryIndex, SqliteIndex, VectorIndex};
use tracing::info;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PaperSageConfig,
    pub engine: Arc<PaperSearch>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: PaperSageConfig, engine: PaperSearch) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            started_at: Instant::now(),
        }
    }

    /// Wire up embedder, index, arXiv client and engine from configuration.
    ///
    /// Model loading falls back to the configured fallback model; index and
    /// collection setup errors propagate.
    pub fn from_config(config: PaperSageConfig) -> Result<Self> {
        let embedder = papersage_infer::create_embedder(&config.model)?;
        if embedder.dimension() != config.embedding_dim {
            info!(
                "Embedder {} has dimension {} (configured {}); collection uses the model's",
                embedder.model_name(),
                embedder.dimension(),
                config.embedding_dim
            );
        }

        let index: Arc<dyn VectorIndex> = match config.index {
            IndexBackend::Memory => Arc::new(MemoryIndex::new()),
            IndexBackend::Sqlite => Arc::new(SqliteIndex::open(config.vectordb_dir())?),
        };

        let catalog = Arc::new(ArxivClient::new(config.catalog.clone())?);
        let fetcher = Arc::new(MetadataFetcher::with_policy(catalog, &config.metadata_cache));

        let engine = PaperSearch::new(embedder, index, fetcher, config.collection_name.clone())
            .with_smart_strategy(smart_strategy(&config)?);
        engine.ensure_collection()?;
        if config.seed_demo_data {
            engine.add_demo_data()?;
        }

        Ok(Self::new(config, engine))
    }

    pub fn compute(&self) -> ComputeResources {
        self.config.model.compute
    }
}

/// Smart-search strategy from `smart_search_fixed_mode`.
pub fn smart_strategy(config: &PaperSageConfig) -> Result<SmartStrategy> {
    match config.smart_search_fixed_mode.as_deref() {
        None => Ok(SmartStrategy::Escalate),
        Some(name) => name
            .parse::<SearchMode>()
            .map(SmartStrategy::Fixed)
            .map_err(|e| Error::Config(format!("smart_search_fixed_mode: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_strategy_from_config() {
        let mut config = PaperSageConfig::default();
        assert_eq!(smart_strategy(&config).unwrap(), SmartStrategy::Escalate);

        config.smart_search_fixed_mode = Some("balanced".into());
        assert_eq!(
            smart_strategy(&config).unwrap(),
            SmartStrategy::Fixed(SearchMode::Balanced)
        );

        config.smart_search_fixed_mode = Some("warp".into());
        assert!(matches!(smart_strategy(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_with_hashing_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PaperSageConfig::with_data_dir(dir.path());
        config.model.primary = "fnv1a-768".into();
        config.model.fallback = None;
        config.index = IndexBackend::Sqlite;
        config.seed_demo_data = true;

        let state = AppState::from_config(config).unwrap();
        let stats = state.engine.stats().unwrap();
        assert_eq!(stats.collection.points_count, 3);
        assert_eq!(stats.embedding_dim, 768);
        assert!(state.config.vectordb_dir().join("papersage.db").exists());
    }

    #[test]
    fn test_from_config_without_models_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PaperSageConfig::with_data_dir(dir.path());
        config.model.model_dir = dir.path().join("models");
        assert!(matches!(
            AppState::from_config(config),
            Err(Error::ModelLoad(_))
        ));
    }
}
