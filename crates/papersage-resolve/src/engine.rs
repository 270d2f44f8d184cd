//! PaperSearch: embed, query the index, enrich with metadata.

use std::sync::Arc;
use std::time::Instant;

use papersage_catalog::{canonical_id, FetcherStats, MetadataFetcher};
use papersage_core::{Error, Result};
use papersage_infer::EmbedderBackend;
use papersage_store::{
    CollectionConfig, CollectionInfo, Payload, Point, ScoredPoint, VectorIndex,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::demo::demo_papers;
use crate::modes::SearchMode;
use crate::select::{select_best_mode, select_smart_mode};
use crate::types::*;

/// Engine summary for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub collection: CollectionInfo,
    pub model: String,
    pub embedding_dim: usize,
    pub metadata: FetcherStats,
}

/// Semantic paper search over one collection.
pub struct PaperSearch {
    embedder: Arc<dyn EmbedderBackend>,
    index: Arc<dyn VectorIndex>,
    fetcher: Arc<MetadataFetcher>,
    collection: String,
    smart_strategy: SmartStrategy,
}

impl PaperSearch {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        index: Arc<dyn VectorIndex>,
        fetcher: Arc<MetadataFetcher>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            fetcher,
            collection: collection.into(),
            smart_strategy: SmartStrategy::default(),
        }
    }

    pub fn with_smart_strategy(mut self, strategy: SmartStrategy) -> Self {
        self.smart_strategy = strategy;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> &Arc<dyn EmbedderBackend> {
        &self.embedder
    }

    pub fn fetcher(&self) -> &Arc<MetadataFetcher> {
        &self.fetcher
    }

    pub fn smart_strategy(&self) -> SmartStrategy {
        self.smart_strategy
    }

    /// Create the collection with the embedder's dimension if it is missing.
    ///
    /// Returns whether it was created. An existing collection with another
    /// dimension is an `Error::Index`.
    pub fn ensure_collection(&self) -> Result<bool> {
        let config = CollectionConfig::cosine(&self.collection, self.embedder.dimension());
        let created = self.index.ensure_collection(&config)?;
        if created {
            info!(
                "Created collection {} (dim={})",
                self.collection,
                config.dimension
            );
        }
        Ok(created)
    }

    /// Embed and upsert papers. Payload carries `arxiv_id` and `title`.
    pub fn index_papers(&self, papers: &[PaperRecord]) -> Result<usize> {
        if papers.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = papers.iter().map(|p| p.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let points: Vec<Point> = papers
            .iter()
            .zip(embeddings)
            .map(|(paper, result)| {
                let mut payload = Payload::new();
                payload.insert("arxiv_id".into(), json!(canonical_id(&paper.arxiv_id)));
                payload.insert("title".into(), json!(paper.title));
                Point {
                    id: paper.id,
                    vector: result.embedding.to_vec(),
                    payload,
                }
            })
            .collect();

        let count = self.index.upsert(&self.collection, points)?;
        info!("Indexed {} papers into {}", count, self.collection);
        Ok(count)
    }

    /// Seed the demo papers (idempotent: fixed point ids).
    pub fn add_demo_data(&self) -> Result<usize> {
        self.ensure_collection()?;
        let count = self.index_papers(&demo_papers())?;
        info!("Added {} demo papers", count);
        Ok(count)
    }

    /// One search in one mode.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
        enrich: bool,
    ) -> Result<SearchOutcome> {
        let (hits, latency_ms) = self.run_query(query, top_k, mode)?;
        let metadata = if enrich {
            self.enrich(&hits)
        } else {
            MetadataMap::new()
        };
        Ok(SearchOutcome {
            mode,
            hits,
            latency_ms,
            metadata,
        })
    }

    /// Run every mode and pick the one with the highest mean score.
    pub fn compare_modes(&self, query: &str, top_k: usize, enrich: bool) -> Result<SearchReport> {
        let mut modes = Vec::with_capacity(SearchMode::ALL.len());
        let mut metadata = MetadataMap::new();
        for mode in SearchMode::ALL {
            let outcome = self.search(query, top_k, mode, enrich)?;
            metadata.extend(outcome.metadata);
            modes.push(ModeResult::from_hits(mode, outcome.hits, outcome.latency_ms));
        }

        let best_mode = select_best_mode(&modes)
            .ok_or_else(|| Error::Internal("no search modes ran".into()))?;
        debug!(
            "compare_modes: best={} means=[{}]",
            best_mode,
            modes
                .iter()
                .map(|m| format!("{}={:.3}", m.mode, m.mean_score))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(SearchReport {
            modes,
            best_mode,
            metadata,
        })
    }

    /// Cheapest mode that yields `min_good_results` good results.
    ///
    /// With `SmartStrategy::Fixed` the fixed mode runs alone. Only the
    /// chosen mode's hits are enriched.
    pub fn smart_search(
        &self,
        query: &str,
        top_k: usize,
        min_good_results: usize,
        enrich: bool,
    ) -> Result<SmartOutcome> {
        let plan: Vec<SearchMode> = match self.smart_strategy {
            SmartStrategy::Fixed(mode) => vec![mode],
            SmartStrategy::Escalate => SearchMode::ALL.to_vec(),
        };

        let mut tried = Vec::with_capacity(plan.len());
        for mode in plan {
            let (hits, latency_ms) = self.run_query(query, top_k, mode)?;
            let result = ModeResult::from_hits(mode, hits, latency_ms);
            let sufficient = result.good_results >= min_good_results;
            tried.push(result);
            if sufficient {
                break;
            }
            debug!(
                "smart_search: {} gave {} good results, need {}",
                mode,
                tried.last().map_or(0, |r| r.good_results),
                min_good_results
            );
        }

        let modes_tried: Vec<SearchMode> = tried.iter().map(|r| r.mode).collect();
        let pos = select_smart_mode(&tried, min_good_results)
            .ok_or_else(|| Error::Internal("smart search ran no modes".into()))?;
        let chosen = tried.swap_remove(pos);
        let metadata = if enrich {
            self.enrich(&chosen.hits)
        } else {
            MetadataMap::new()
        };

        Ok(SmartOutcome {
            mode_used: chosen.mode,
            hits: chosen.hits,
            latency_ms: chosen.latency_ms,
            modes_tried,
            metadata,
        })
    }

    pub fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            collection: self.index.collection_info(&self.collection)?,
            model: self.embedder.model_name().to_string(),
            embedding_dim: self.embedder.dimension(),
            metadata: self.fetcher.stats(),
        })
    }

    /// Embed and query; latency covers both.
    fn run_query(
        &self,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> Result<(Vec<ScoredPoint>, f64)> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        if top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".into()));
        }

        let start = Instant::now();
        let embedding = self.embedder.embed(query)?;
        let vector = embedding.embedding.to_vec();
        let hits = self
            .index
            .search(&self.collection, &vector, top_k, &mode.search_params())?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            "search mode={} top_k={} hits={} in {:.1}ms{}",
            mode,
            top_k,
            hits.len(),
            latency_ms,
            if embedding.cached { " (cached query)" } else { "" }
        );
        Ok((hits, latency_ms))
    }

    /// Metadata for the hits' `arxiv_id` payloads. Never fails.
    fn enrich(&self, hits: &[ScoredPoint]) -> MetadataMap {
        let ids: Vec<&str> = hits.iter().filter_map(|h| h.payload_str("arxiv_id")).collect();
        if ids.is_empty() {
            return MetadataMap::new();
        }
        self.fetcher.fetch(ids.as_slice())
    }
}
