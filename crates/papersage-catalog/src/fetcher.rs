//! Memoizing metadata fetcher.
//!
//! Cache hits are served locally and every miss goes out in one catalog
//! batch. Catalog failures are logged and degrade to a smaller result map;
//! enrichment never fails a search.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use papersage_core::{CachePolicy, MemoCache};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::ids::canonical_id;
use crate::types::{MetadataCatalog, PaperMetadata};

/// Counters since process start (or the last `clear_cache`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetcherStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub remote_calls: u64,
    pub remote_failures: u64,
    pub cached_records: usize,
}

/// Resolves arXiv ids to metadata through a cache in front of a catalog.
pub struct MetadataFetcher {
    catalog: Arc<dyn MetadataCatalog>,
    cache: MemoCache<PaperMetadata>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    remote_calls: AtomicU64,
    remote_failures: AtomicU64,
}

impl MetadataFetcher {
    /// Fetcher with an unbounded cache.
    pub fn new(catalog: Arc<dyn MetadataCatalog>) -> Self {
        Self::with_policy(catalog, &CachePolicy::default())
    }

    pub fn with_policy(catalog: Arc<dyn MetadataCatalog>, policy: &CachePolicy) -> Self {
        Self {
            catalog,
            cache: MemoCache::from_policy(policy),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            remote_calls: AtomicU64::new(0),
            remote_failures: AtomicU64::new(0),
        }
    }

    /// Metadata for `ids`, keyed by canonical id.
    ///
    /// Ids the catalog does not know, or that a failed request left
    /// unresolved, are simply absent.
    pub fn fetch<S: AsRef<str>>(&self, ids: &[S]) -> HashMap<String, PaperMetadata> {
        let mut seen = HashSet::new();
        let requested: Vec<String> = ids
            .iter()
            .map(|id| canonical_id(id.as_ref()))
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        let mut results = HashMap::with_capacity(requested.len());
        let mut misses = Vec::new();
        for id in requested {
            match self.cache.get(&id) {
                Some(record) => {
                    results.insert(id, record);
                }
                None => misses.push(id),
            }
        }
        self.cache_hits
            .fetch_add(results.len() as u64, Ordering::Relaxed);
        self.cache_misses
            .fetch_add(misses.len() as u64, Ordering::Relaxed);

        if misses.is_empty() {
            return results;
        }

        self.remote_calls.fetch_add(1, Ordering::Relaxed);
        let records = match self.catalog.fetch_batch(&misses) {
            Ok(records) => records,
            Err(e) => {
                self.remote_failures.fetch_add(1, Ordering::Relaxed);
                error!("Error fetching metadata for {} papers: {}", misses.len(), e);
                return results;
            }
        };

        let wanted: HashSet<&str> = misses.iter().map(String::as_str).collect();
        for mut record in records {
            let id = canonical_id(&record.arxiv_id);
            if id.is_empty() {
                continue;
            }
            record.arxiv_id = id.clone();
            let stored = self.cache.insert_if_absent(id.clone(), record);
            if wanted.contains(id.as_str()) {
                results.insert(id, stored);
            } else {
                debug!("Catalog returned unrequested record {}", id);
            }
        }

        let unresolved = misses.iter().filter(|id| !results.contains_key(*id)).count();
        if unresolved > 0 {
            warn!("{} of {} requested papers not found in catalog", unresolved, misses.len());
        }
        results
    }

    /// Number of cached records.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> FetcherStats {
        FetcherStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            remote_calls: self.remote_calls.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            cached_records: self.cache.len(),
        }
    }

    /// Drop every cached record and reset the counters.
    pub fn clear_cache(&self) {
        self.cache.clear();
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.remote_calls,
            &self.remote_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
